//! Metrics module
//!
//! Exposes the pre-warming statistics in Prometheus format.

mod exporter;

pub use exporter::PrewarmMetrics;
