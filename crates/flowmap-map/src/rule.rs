use std::fmt;

use flowmap_model::{FlowIdAllocator, Match, MatchCondition, NormalizedFlow};

use crate::error::Result;

/// Shared state a rule may need besides the flows themselves.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Allocator for flows a rule synthesizes.
    pub ids: &'a FlowIdAllocator,
}

/// Signature of a rule body: still-unmatched sources and every target.
pub type RuleFn = dyn Fn(
        &mut [&mut NormalizedFlow],
        &mut [NormalizedFlow],
        &RuleContext<'_>,
    ) -> Result<Vec<Match>>
    + Send
    + Sync;

/// A named matching rule.
///
/// The name is recorded as `function_name` on every match the rule emits
/// and used in logs and run summaries.
pub struct MatchRule {
    name: String,
    condition: MatchCondition,
    apply: Box<RuleFn>,
}

impl MatchRule {
    pub fn new<F>(name: impl Into<String>, condition: MatchCondition, apply: F) -> Self
    where
        F: Fn(
                &mut [&mut NormalizedFlow],
                &mut [NormalizedFlow],
                &RuleContext<'_>,
            ) -> Result<Vec<Match>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            condition,
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn condition(&self) -> MatchCondition {
        self.condition
    }

    pub fn apply(
        &self,
        sources: &mut [&mut NormalizedFlow],
        targets: &mut [NormalizedFlow],
        context: &RuleContext<'_>,
    ) -> Result<Vec<Match>> {
        (self.apply)(sources, targets, context)
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("name", &self.name)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
