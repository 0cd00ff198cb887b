//! Prediction Filter
//!
//! Narrows the prediction source's ranked forecasts down to this cycle's
//! priority list of resource identifiers.

use std::collections::HashSet;

use crate::domain::{Forecast, ResourceId};

use super::mapping::MappingTable;

/// Default minimum forecast probability (inclusive)
pub const DEFAULT_MINIMUM_PROBABILITY: f64 = 0.25;

/// Default number of forecasts considered per cycle
pub const DEFAULT_MAX_CANDIDATES: usize = 2;

/// Threshold, cap, resolve and de-duplicate forecasts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionFilter {
    /// Forecasts strictly below this are dropped
    pub minimum_probability: f64,
    /// At most this many surviving forecasts are resolved
    pub max_candidates: usize,
}

impl Default for PredictionFilter {
    fn default() -> Self {
        Self {
            minimum_probability: DEFAULT_MINIMUM_PROBABILITY,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl PredictionFilter {
    pub fn new(minimum_probability: f64, max_candidates: usize) -> Self {
        Self {
            minimum_probability,
            max_candidates,
        }
    }

    /// Build the priority list.
    ///
    /// Input order is kept as given (the source ranks it); the cap applies
    /// before mapping resolution, so an unmapped forecast still uses a slot.
    /// An empty result is the normal "nothing to do" outcome.
    pub fn select(&self, forecasts: &[Forecast], mapping: &MappingTable) -> Vec<ResourceId> {
        let mut seen = HashSet::new();

        forecasts
            .iter()
            .filter(|f| f.probability() >= self.minimum_probability)
            .take(self.max_candidates)
            .filter_map(|f| mapping.resolve(f.task_type()))
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskType;

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn fc(task: TaskType, p: f64) -> Forecast {
        Forecast::new(task, p).unwrap()
    }

    fn full_mapping() -> MappingTable {
        [
            (TaskType::CodeGen, rid("code-model")),
            (TaskType::Math, rid("math-model")),
            (TaskType::Writing, rid("writer-model")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let filter = PredictionFilter::default();
        let mapping = full_mapping();

        let kept = filter.select(&[fc(TaskType::Math, 0.25)], &mapping);
        assert_eq!(kept, vec![rid("math-model")]);

        let dropped = filter.select(&[fc(TaskType::Math, 0.2499)], &mapping);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_cap_keeps_source_order() {
        let filter = PredictionFilter::default();
        let forecasts = [
            fc(TaskType::Writing, 0.5),
            fc(TaskType::CodeGen, 0.3),
            fc(TaskType::Math, 0.28),
        ];

        assert_eq!(
            filter.select(&forecasts, &full_mapping()),
            vec![rid("writer-model"), rid("code-model")]
        );
    }

    #[test]
    fn test_does_not_resort() {
        let filter = PredictionFilter::new(0.0, 3);
        let forecasts = [fc(TaskType::Math, 0.1), fc(TaskType::CodeGen, 0.9)];

        assert_eq!(
            filter.select(&forecasts, &full_mapping()),
            vec![rid("math-model"), rid("code-model")]
        );
    }

    #[test]
    fn test_unmapped_task_is_skipped() {
        let filter = PredictionFilter::default();
        let forecasts = [fc(TaskType::Analysis, 0.9), fc(TaskType::Math, 0.5)];

        assert_eq!(filter.select(&forecasts, &full_mapping()), vec![rid("math-model")]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let filter = PredictionFilter::new(0.0, 4);
        let mapping: MappingTable = [
            (TaskType::CodeGen, rid("A")),
            (TaskType::Math, rid("B")),
            (TaskType::Writing, rid("A")),
            (TaskType::Analysis, rid("C")),
        ]
        .into_iter()
        .collect();
        let forecasts = [
            fc(TaskType::CodeGen, 0.4),
            fc(TaskType::Math, 0.3),
            fc(TaskType::Writing, 0.2),
            fc(TaskType::Analysis, 0.1),
        ];

        assert_eq!(
            filter.select(&forecasts, &mapping),
            vec![rid("A"), rid("B"), rid("C")]
        );
    }

    #[test]
    fn test_empty_inputs() {
        let filter = PredictionFilter::default();
        assert!(filter.select(&[], &full_mapping()).is_empty());
        assert!(filter
            .select(&[fc(TaskType::Math, 0.9)], &MappingTable::new())
            .is_empty());
    }
}
