//! Pre-warming Statistics
//!
//! Running counters for the orchestrator and the rates derived from them.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Counter collector shared by the cycle and the usage-report path
#[derive(Debug, Default)]
pub struct StatsTracker {
    checks_performed: AtomicU64,
    preload_attempts: AtomicU64,
    successful_preloads: AtomicU64,
    successful_predictions: AtomicU64,
    total_usages: AtomicU64,
    evictions: AtomicU64,
    last_check_at: RwLock<Option<DateTime<Utc>>>,
}

impl StatsTracker {
    /// Create a new tracker with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self) {
        self.checks_performed.fetch_add(1, Ordering::Relaxed);
        *self.last_check_at.write() = Some(Utc::now());
    }

    pub fn record_preload_attempt(&self) {
        self.preload_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preload_success(&self) {
        self.successful_preloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one usage; `was_warm` marks a successful prediction.
    pub fn record_usage(&self, was_warm: bool) {
        self.total_usages.fetch_add(1, Ordering::Relaxed);
        if was_warm {
            self.successful_predictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Explicit reinitialization; the only way counters go down.
    pub fn reset(&self) {
        self.checks_performed.store(0, Ordering::Relaxed);
        self.preload_attempts.store(0, Ordering::Relaxed);
        self.successful_preloads.store(0, Ordering::Relaxed);
        self.successful_predictions.store(0, Ordering::Relaxed);
        self.total_usages.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        *self.last_check_at.write() = None;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checks_performed: self.checks_performed.load(Ordering::Relaxed),
            preload_attempts: self.preload_attempts.load(Ordering::Relaxed),
            successful_preloads: self.successful_preloads.load(Ordering::Relaxed),
            successful_predictions: self.successful_predictions.load(Ordering::Relaxed),
            total_usages: self.total_usages.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            last_check_at: *self.last_check_at.read(),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub checks_performed: u64,
    pub preload_attempts: u64,
    pub successful_preloads: u64,
    pub successful_predictions: u64,
    pub total_usages: u64,
    pub evictions: u64,
    pub last_check_at: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    /// Fraction of usages whose resource was already warm (0 with no usages)
    pub fn hit_rate(&self) -> f64 {
        ratio(self.successful_predictions, self.total_usages)
    }

    /// Fraction of preload attempts that succeeded (0 with no attempts)
    pub fn preload_success_rate(&self) -> f64 {
        ratio(self.successful_preloads, self.preload_attempts)
    }

    /// Preload attempts that did not succeed
    pub fn failed_preloads(&self) -> u64 {
        self.preload_attempts.saturating_sub(self.successful_preloads)
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_three_of_four() {
        let stats = StatsTracker::new();
        stats.record_usage(true);
        stats.record_usage(true);
        stats.record_usage(false);
        stats.record_usage(true);

        let snap = stats.snapshot();
        assert_eq!(snap.total_usages, 4);
        assert_eq!(snap.successful_predictions, 3);
        assert_eq!(snap.hit_rate(), 0.75);
    }

    #[test]
    fn test_rates_are_zero_without_samples() {
        let snap = StatsTracker::new().snapshot();
        assert_eq!(snap.hit_rate(), 0.0);
        assert_eq!(snap.preload_success_rate(), 0.0);
        assert!(snap.last_check_at.is_none());
    }

    #[test]
    fn test_preload_counters() {
        let stats = StatsTracker::new();
        stats.record_preload_attempt();
        stats.record_preload_attempt();
        stats.record_preload_success();

        let snap = stats.snapshot();
        assert_eq!(snap.preload_success_rate(), 0.5);
        assert_eq!(snap.failed_preloads(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let stats = StatsTracker::new();
        stats.record_check();
        stats.record_usage(true);
        stats.record_eviction();
        assert!(stats.snapshot().last_check_at.is_some());

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
