//! Property-Based Tests for the Pre-warming Core
//!
//! # Test Properties
//!
//! 1. **Capacity**: after any completed cycle the warm set fits in capacity
//! 2. **Priority Protection**: eviction never picks a priority entry
//! 3. **Filter Shape**: output is unique, capped and above threshold

#![cfg(test)]

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use proptest::prelude::*;

use super::eviction::EvictionPolicy;
use super::filter::PredictionFilter;
use super::mapping::MappingTable;
use super::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::adapters::{InMemoryPersistenceStore, SimulatedLoader};
use crate::domain::{Forecast, PredictionSource, ResourceId, TaskType};
use crate::error::Result;

// =============================================================================
// Property Strategies
// =============================================================================

fn task_strategy() -> impl Strategy<Value = TaskType> {
    prop::sample::select(TaskType::ALL.to_vec())
}

/// Ranked forecast lists, descending like a real source
fn forecasts_strategy() -> impl Strategy<Value = Vec<Forecast>> {
    prop::collection::vec((task_strategy(), 0.0f64..=1.0), 0..6).prop_map(|mut raw| {
        raw.sort_by(|a, b| b.1.total_cmp(&a.1));
        raw.into_iter()
            .filter_map(|(task, p)| Forecast::new(task, p).ok())
            .collect()
    })
}

fn id_strategy() -> impl Strategy<Value = ResourceId> {
    "[a-f]{1,2}".prop_map(|s| ResourceId::new(s).unwrap())
}

/// Several task types may share a resource; some stay unmapped.
fn mapping_strategy() -> impl Strategy<Value = MappingTable> {
    prop::collection::hash_map(task_strategy(), id_strategy(), 0..6)
        .prop_map(|entries| entries.into_iter().collect::<MappingTable>())
}

// =============================================================================
// Cycle Harness
// =============================================================================

struct QueuedPredictor {
    queue: Mutex<Vec<Vec<Forecast>>>,
}

#[async_trait]
impl PredictionSource for QueuedPredictor {
    async fn predict_next(&self) -> Result<Vec<Forecast>> {
        Ok(self.queue.lock().pop().unwrap_or_default())
    }

    async fn record_task_observed(&self, _task_type: TaskType) {}
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: no history of cycles leaves more than `capacity` entries warm.
    #[test]
    fn prop_capacity_holds_after_every_cycle(
        capacity in 1usize..=4,
        mapping in mapping_strategy(),
        history in prop::collection::vec(forecasts_strategy(), 1..8),
        failing in prop::collection::vec(id_strategy(), 0..3),
    ) {
        tokio_test::block_on(async {
            let mut queue = history;
            queue.reverse();
            let predictor = Arc::new(QueuedPredictor { queue: Mutex::new(queue) });
            let loader = Arc::new(SimulatedLoader::new(Duration::ZERO));
            for id in failing {
                loader.fail_on(id);
            }
            let config = OrchestratorConfig {
                capacity,
                max_candidates: capacity,
                minimum_probability: 0.25,
                ..Default::default()
            };
            let orchestrator = Orchestrator::new(
                config,
                predictor.clone(),
                loader,
                Arc::new(InMemoryPersistenceStore::new()),
            )
            .unwrap();
            orchestrator.update_mapping(mapping);

            while !predictor.queue.lock().is_empty() {
                orchestrator.check_predictions().await;
                prop_assert!(orchestrator.get_warm_resources().len() <= capacity);
            }
            Ok(())
        })?;
    }

    /// Property: victims are never in the priority list, and what remains
    /// fits when the priority list itself fits.
    #[test]
    fn prop_priority_never_evicted(
        capacity in 1usize..=4,
        warm in prop::collection::btree_set(id_strategy(), 0..8),
        priority in prop::collection::vec(id_strategy(), 0..4),
    ) {
        let mut seen = HashSet::new();
        let priority: Vec<ResourceId> =
            priority.into_iter().filter(|id| seen.insert(id.clone())).collect();

        let policy = EvictionPolicy::new(capacity);
        let victims = policy.select_victims(&warm, &priority);

        for victim in &victims {
            prop_assert!(!priority.contains(victim));
            prop_assert!(warm.contains(victim));
        }

        if priority.len() <= capacity {
            let remaining: BTreeSet<_> = warm.iter().filter(|id| !victims.contains(id)).collect();
            let remaining_candidates = remaining.iter().filter(|id| !priority.contains(id)).count();
            prop_assert!(priority.len() + remaining_candidates <= capacity);
        }
    }

    /// Property: filter output is unique, capped and sourced from
    /// forecasts at or above the threshold.
    #[test]
    fn prop_filter_output_shape(
        forecasts in forecasts_strategy(),
        mapping in mapping_strategy(),
        max_candidates in 1usize..=4,
        threshold in 0.0f64..=1.0,
    ) {
        let filter = PredictionFilter::new(threshold, max_candidates);
        let selected = filter.select(&forecasts, &mapping);

        prop_assert!(selected.len() <= max_candidates);

        let unique: HashSet<_> = selected.iter().collect();
        prop_assert_eq!(unique.len(), selected.len());

        for id in &selected {
            let sourced = forecasts.iter().any(|f| {
                f.probability() >= threshold && mapping.resolve(f.task_type()) == Some(id)
            });
            prop_assert!(sourced, "{} not backed by a forecast at or above {}", id, threshold);
        }
    }
}
