use std::fmt;

use crate::error::Result;
use crate::flow::{Flow, FlowUpdate};
use crate::ids::{FlowId, FlowIdAllocator};

/// A flow as seen by the matching engine.
///
/// `original` is the flow as loaded, `normalized` its canonical form and
/// `current` the form rules compare against. `current` equals `normalized`
/// except inside a transformation scope, where it carries temporary
/// overrides.
#[derive(Debug, Clone)]
pub struct NormalizedFlow {
    pub original: Flow,
    pub normalized: Flow,
    pub current: Flow,
    pub matched: bool,
    overrides: FlowUpdate,
}

impl NormalizedFlow {
    pub fn from_flow(flow: Flow, ids: &FlowIdAllocator) -> Result<Self> {
        let normalized = flow.normalize(ids)?;
        Ok(Self {
            original: flow,
            current: normalized.clone(),
            normalized,
            matched: false,
            overrides: FlowUpdate::default(),
        })
    }

    pub fn id(&self) -> FlowId {
        self.original.id()
    }

    /// Rebuilds `current` as `normalized` with `update` applied.
    ///
    /// Not incremental: a second call replaces the first update entirely.
    /// Callers that want to stack updates merge them with
    /// [`overrides`](Self::overrides) first.
    pub fn update_current(&mut self, update: FlowUpdate) {
        self.current = self.normalized.with_update(&update);
        self.overrides = update;
    }

    pub fn reset_current(&mut self) {
        self.current = self.normalized.clone();
        self.overrides = FlowUpdate::default();
    }

    pub fn overrides(&self) -> &FlowUpdate {
        &self.overrides
    }

    pub fn unit_compatible(&self, other: &NormalizedFlow) -> bool {
        self.current.unit.compatible(&other.current.unit)
    }

    /// Multiplier from this flow's amount to `other`'s unit.
    pub fn conversion_factor(&self, other: &NormalizedFlow) -> f64 {
        self.current.conversion_factor.unwrap_or(1.0)
            * self.current.unit.conversion_factor(&other.current.unit)
    }
}

impl fmt::Display for NormalizedFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.original.fmt(f)
    }
}
