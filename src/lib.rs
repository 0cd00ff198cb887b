//! Prewarmer - Predictive Resource Pre-warming
//!
//! A background orchestrator that consumes "what will be needed next"
//! forecasts, keeps the most likely inference models loaded in a bounded
//! warm set, evicts surplus entries under a capacity limit, and tracks
//! whether its bets paid off.
//!
//! # Architecture
//!
//! ```text
//! Prediction Source (Eyes) → Orchestrator (Brain) → Resource Loader (Hands)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Infrastructure adapters implementing domain ports
//! - [`domain`] - Value objects and port traits
//! - [`error`] - Error types
//! - [`metrics`] - Prometheus metrics exposition
//! - [`prewarm`] - Filter, warm set, eviction and the orchestrator
//! - [`server`] - HTTP metrics, health checks and usage reports

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod prewarm;
pub mod server;

// Re-export commonly used types
pub use domain::{Forecast, PersistenceStore, PredictionSource, ResourceId, ResourceLoader, TaskType};
pub use error::{Error, Result};
pub use metrics::PrewarmMetrics;
pub use prewarm::{
    MappingTable, MonitoringState, Orchestrator, OrchestratorConfig, StatsSnapshot,
};
