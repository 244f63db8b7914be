//! Data model for elementary-flow mapping.
//!
//! A [`Flow`] is built from a [`FlowRecord`] and normalized into a
//! [`NormalizedFlow`], which is what the matching rules operate on. Rules
//! emit [`Match`] records pairing original source and target flows.

pub mod cas;
pub mod context;
pub mod error;
pub mod flow;
pub mod ids;
pub mod loader;
pub mod matching;
pub mod normalized;
pub mod oxidation;
pub mod string_field;
pub mod unit;

pub use cas::CasField;
pub use context::{ContextField, RawContext};
pub use error::{ModelError, Result};
pub use flow::{Flow, FlowExport, FlowRecord, FlowUpdate};
pub use ids::{FlowId, FlowIdAllocator};
pub use loader::{flows_from_json, flows_to_json, load_flows};
pub use matching::{FlowmapperMetadata, Match, MatchCondition, MatchExport};
pub use normalized::NormalizedFlow;
pub use oxidation::OxidationState;
pub use string_field::StringField;
pub use unit::UnitField;
