//! Eviction Policy
//!
//! Trims the warm set back to capacity after a cycle's loads, never touching
//! the resources the same cycle just prioritized.
//!
//! This is not LRU: no load or access timestamps are tracked. Among the
//! eviction candidates, victims are chosen in lexical identifier order so the
//! outcome is deterministic.

use std::collections::HashSet;

use crate::domain::ResourceId;

/// Default number of resources kept warm
pub const DEFAULT_CAPACITY: usize = 2;

/// Capacity-bounded victim selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub capacity: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl EvictionPolicy {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Number of candidates that must go:
    /// `max(0, |priority| + |candidates| - capacity)`
    pub fn excess(&self, priority_len: usize, candidate_len: usize) -> usize {
        (priority_len + candidate_len).saturating_sub(self.capacity)
    }

    /// Pick the warm entries to remove.
    ///
    /// Candidates are the warm entries absent from `priority`. The whole
    /// priority list counts toward capacity, including entries whose load
    /// failed this cycle.
    pub fn select_victims<'a, I>(&self, warm: I, priority: &[ResourceId]) -> Vec<ResourceId>
    where
        I: IntoIterator<Item = &'a ResourceId>,
    {
        let protected: HashSet<&ResourceId> = priority.iter().collect();

        let mut candidates: Vec<&ResourceId> = warm
            .into_iter()
            .filter(|id| !protected.contains(id))
            .collect();
        candidates.sort();
        candidates.dedup();

        let excess = self.excess(protected.len(), candidates.len());

        candidates.into_iter().take(excess).cloned().collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ResourceId> {
        names.iter().map(|n| ResourceId::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_excess_formula() {
        let policy = EvictionPolicy::default();
        assert_eq!(policy.excess(1, 2), 1);
        assert_eq!(policy.excess(2, 0), 0);
        assert_eq!(policy.excess(0, 1), 0);
        assert_eq!(policy.excess(2, 3), 3);
    }

    #[test]
    fn test_under_capacity_evicts_nothing() {
        let policy = EvictionPolicy::default();
        let warm = ids(&["X"]);
        assert!(policy.select_victims(&warm, &ids(&["Z"])).is_empty());
    }

    #[test]
    fn test_eviction_under_pressure() {
        let policy = EvictionPolicy::default();
        let warm = ids(&["X", "Y", "Z"]);

        let victims = policy.select_victims(&warm, &ids(&["Z"]));
        assert_eq!(victims, ids(&["X"]));
    }

    #[test]
    fn test_priority_members_are_never_victims() {
        let policy = EvictionPolicy::new(1);
        let warm = ids(&["A", "B", "C"]);

        let victims = policy.select_victims(&warm, &ids(&["B", "C"]));
        assert_eq!(victims, ids(&["A"]));
    }

    #[test]
    fn test_victims_follow_lexical_order() {
        let policy = EvictionPolicy::new(2);
        let warm = ids(&["m", "c", "x", "a"]);

        let victims = policy.select_victims(&warm, &ids(&["x"]));
        assert_eq!(victims, ids(&["a", "c"]));
    }

    #[test]
    fn test_unloaded_priority_still_counts() {
        let policy = EvictionPolicy::new(2);
        // "new" failed to load, so it is not warm
        let warm = ids(&["X", "Y"]);

        let victims = policy.select_victims(&warm, &ids(&["new"]));
        assert_eq!(victims, ids(&["X"]));
    }
}
