//! Rule-based matching of elementary flows.
//!
//! A [`Flowmap`] runs an ordered list of [`MatchRule`]s over a source and a
//! target flow list. Each rule sees only the sources no earlier rule
//! matched, so a source is matched at most once per run.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod flowmap;
pub mod matching;
pub mod rule;
pub mod rules;
pub mod transform;

pub use config::MatchingConfig;
pub use error::{MapError, Result};
pub use flowmap::{Cardinality, CardinalityRow, ContextStatistics, Flowmap, RuleSummary};
pub use matching::{MatchLabel, get_matches};
pub use rule::{MatchRule, RuleContext, RuleFn};
pub use rules::RuleKind;
pub use transform::{Migration, Transform, TransformationScope};
