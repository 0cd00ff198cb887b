//! Transition Predictor
//!
//! Built-in `PredictionSource`: learns from observed tasks and forecasts the
//! next one from first-order transition counts out of the most recently
//! observed task. Until that task has enough outgoing samples, it falls back
//! to global task frequencies.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::domain::{Forecast, PredictionSource, TaskType};
use crate::error::Result;

/// Outgoing transitions required before they override global frequencies
pub const DEFAULT_MIN_TRANSITION_SAMPLES: u64 = 3;

#[derive(Debug, Default)]
struct History {
    last: Option<TaskType>,
    frequency: HashMap<TaskType, u64>,
    transitions: HashMap<TaskType, HashMap<TaskType, u64>>,
}

impl History {
    fn observe(&mut self, task: TaskType) {
        *self.frequency.entry(task).or_default() += 1;
        if let Some(prev) = self.last {
            *self
                .transitions
                .entry(prev)
                .or_default()
                .entry(task)
                .or_default() += 1;
        }
        self.last = Some(task);
    }
}

/// Frequency/transition based prediction source
#[derive(Debug)]
pub struct TransitionPredictor {
    history: Mutex<History>,
    min_transition_samples: u64,
}

impl Default for TransitionPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TRANSITION_SAMPLES)
    }
}

impl TransitionPredictor {
    pub fn new(min_transition_samples: u64) -> Self {
        Self {
            history: Mutex::new(History::default()),
            min_transition_samples,
        }
    }

    /// Seed from a past sequence of observed tasks, oldest first
    pub fn with_history(tasks: impl IntoIterator<Item = TaskType>) -> Self {
        let predictor = Self::default();
        {
            let mut history = predictor.history.lock();
            for task in tasks {
                history.observe(task);
            }
        }
        predictor
    }

    pub fn observe(&self, task: TaskType) {
        self.history.lock().observe(task);
    }

    /// Total observations so far
    pub fn observations(&self) -> u64 {
        self.history.lock().frequency.values().sum()
    }

    /// Ranked forecasts, descending by probability; ties keep `TaskType` order.
    pub fn forecast(&self) -> Vec<Forecast> {
        let history = self.history.lock();

        let transition_counts = history
            .last
            .and_then(|last| history.transitions.get(&last))
            .filter(|counts| counts.values().sum::<u64>() >= self.min_transition_samples);

        let counts = transition_counts.unwrap_or(&history.frequency);
        let total: u64 = counts.values().sum();
        if total == 0 {
            return Vec::new();
        }

        let mut forecasts: Vec<Forecast> = TaskType::ALL
            .iter()
            .filter_map(|task| {
                let count = counts.get(task).copied().unwrap_or(0);
                if count == 0 {
                    return None;
                }
                let probability = (count as f64 / total as f64).clamp(0.0, 1.0);
                Forecast::new(*task, probability).ok()
            })
            .collect();

        forecasts.sort_by(|a, b| b.probability().total_cmp(&a.probability()));
        forecasts
    }
}

#[async_trait]
impl PredictionSource for TransitionPredictor {
    #[instrument(skip(self))]
    async fn predict_next(&self) -> Result<Vec<Forecast>> {
        let forecasts = self.forecast();
        debug!(count = forecasts.len(), "Produced forecasts");
        Ok(forecasts)
    }

    async fn record_task_observed(&self, task_type: TaskType) {
        self.observe(task_type);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_no_forecast() {
        assert!(TransitionPredictor::default().forecast().is_empty());
    }

    #[test]
    fn test_frequency_fallback() {
        let predictor = TransitionPredictor::with_history([
            TaskType::Math,
            TaskType::CodeGen,
            TaskType::CodeGen,
            TaskType::CodeGen,
        ]);

        // CodeGen has two outgoing transitions, under the sample minimum
        let forecasts = predictor.forecast();
        assert_eq!(forecasts[0].task_type(), TaskType::CodeGen);
        assert_eq!(forecasts[0].probability(), 0.75);
        assert_eq!(forecasts[1].task_type(), TaskType::Math);
        assert_eq!(forecasts[1].probability(), 0.25);
    }

    #[test]
    fn test_transitions_override_frequency() {
        // Writing is globally most frequent, but after Math comes CodeGen.
        let predictor = TransitionPredictor::with_history([
            TaskType::Writing,
            TaskType::Writing,
            TaskType::Writing,
            TaskType::Writing,
            TaskType::Math,
            TaskType::CodeGen,
            TaskType::Math,
            TaskType::CodeGen,
            TaskType::Math,
            TaskType::CodeGen,
            TaskType::Math,
        ]);

        let forecasts = predictor.forecast();
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].task_type(), TaskType::CodeGen);
        assert_eq!(forecasts[0].probability(), 1.0);
    }

    #[test]
    fn test_forecasts_sorted_descending() {
        let predictor = TransitionPredictor::with_history([
            TaskType::Analysis,
            TaskType::Summarization,
            TaskType::Summarization,
            TaskType::Conversation,
            TaskType::Summarization,
            TaskType::Conversation,
        ]);

        let probs: Vec<f64> = predictor.forecast().iter().map(|f| f.probability()).collect();
        assert!(probs.windows(2).all(|w| w[0] >= w[1]));
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_feedback_updates_history() {
        let predictor = TransitionPredictor::default();
        predictor.record_task_observed(TaskType::Math).await;
        predictor.record_task_observed(TaskType::Math).await;

        assert_eq!(predictor.observations(), 2);
        let forecasts = predictor.predict_next().await.unwrap();
        assert_eq!(forecasts[0].task_type(), TaskType::Math);
    }
}
