#![deny(unsafe_code)]

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a [`Flow`](crate::Flow) instance.
///
/// Identity is not content: two flows built from the same record get
/// different ids. Ids increase in construction order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct FlowId(u64);

impl FlowId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing [`FlowId`]s.
///
/// One allocator is owned per mapping run and passed to every flow
/// construction, so ids are reproducible for a given input.
#[derive(Debug, Default)]
pub struct FlowIdAllocator {
    next: AtomicU64,
}

impl FlowIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> FlowId {
        FlowId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_per_allocator() {
        let ids = FlowIdAllocator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(a < b);
        assert_eq!(ids.allocated(), 2);

        let other = FlowIdAllocator::new();
        assert_eq!(other.next_id(), a);
    }
}
