//! Prometheus Exporter
//!
//! Mirrors the orchestrator's counters into a private registry and renders
//! the text exposition format served on `/metrics`.

use prometheus::{Encoder, Gauge, IntGauge, Registry, TextEncoder};

use crate::error::{Error, Result};
use crate::prewarm::StatsSnapshot;

/// Gauges published for the pre-warming orchestrator
///
/// The counters are exported as gauges without a `_total` suffix:
/// `reset_stats` can move them back to zero.
pub struct PrewarmMetrics {
    registry: Registry,
    checks_performed: IntGauge,
    preload_attempts: IntGauge,
    successful_preloads: IntGauge,
    successful_predictions: IntGauge,
    total_usages: IntGauge,
    evictions: IntGauge,
    warm_resources: IntGauge,
    hit_rate: Gauge,
}

impl PrewarmMetrics {
    /// Create and register every gauge
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let int_gauge = |name: &str, help: &str| -> Result<IntGauge> {
            let gauge = IntGauge::new(name, help)?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let checks_performed = int_gauge(
            "prewarm_checks_performed",
            "Prediction cycles run",
        )?;
        let preload_attempts = int_gauge(
            "prewarm_preload_attempts",
            "Resource loads started by the orchestrator",
        )?;
        let successful_preloads = int_gauge(
            "prewarm_successful_preloads",
            "Resource loads that completed successfully",
        )?;
        let successful_predictions = int_gauge(
            "prewarm_successful_predictions",
            "Usages served by a resource that was already warm",
        )?;
        let total_usages = int_gauge("prewarm_usages", "Usages reported")?;
        let evictions = int_gauge("prewarm_evictions", "Warm resources evicted")?;
        let warm_resources = int_gauge("prewarm_warm_resources", "Resources currently warm")?;

        let hit_rate = Gauge::new("prewarm_hit_rate", "Fraction of usages that hit a warm resource")?;
        registry.register(Box::new(hit_rate.clone()))?;

        Ok(Self {
            registry,
            checks_performed,
            preload_attempts,
            successful_preloads,
            successful_predictions,
            total_usages,
            evictions,
            warm_resources,
            hit_rate,
        })
    }

    /// Copy a stats snapshot into the gauges
    pub fn update(&self, stats: &StatsSnapshot, warm_count: usize) {
        self.checks_performed.set(saturating_i64(stats.checks_performed));
        self.preload_attempts.set(saturating_i64(stats.preload_attempts));
        self.successful_preloads
            .set(saturating_i64(stats.successful_preloads));
        self.successful_predictions
            .set(saturating_i64(stats.successful_predictions));
        self.total_usages.set(saturating_i64(stats.total_usages));
        self.evictions.set(saturating_i64(stats.evictions));
        self.warm_resources.set(saturating_i64(warm_count as u64));
        self.hit_rate.set(stats.hit_rate());
    }

    /// Render the text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("Metrics output is not UTF-8: {}", e)))
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// =============================================================================
// Tests
// =============================================================================
