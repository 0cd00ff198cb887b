//! Predictive Pre-warming Core
//!
//! Keeps a bounded set of heavyweight resources loaded ahead of demand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           Orchestrator                                │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  PredictionSource ──▶ PredictionFilter ──▶ MappingTable               │
//! │                              │                                        │
//! │                              ▼                                        │
//! │                       priority list ──▶ ResourceLoader ──▶ WarmSet    │
//! │                                                              │        │
//! │                                           EvictionPolicy ◀───┘        │
//! │                                                                       │
//! │  StatsTracker: checks, attempts, successes, usages, hits              │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One cycle: fetch forecasts, narrow them to a priority list, load what is
//! not yet warm, then evict non-priority entries until back at capacity.

mod eviction;
mod filter;
mod mapping;
mod orchestrator;
mod stats;
mod warm_set;

#[cfg(test)]
mod proptest;

pub use eviction::{EvictionPolicy, DEFAULT_CAPACITY};
pub use filter::{PredictionFilter, DEFAULT_MAX_CANDIDATES, DEFAULT_MINIMUM_PROBABILITY};
pub use mapping::MappingTable;
pub use orchestrator::{MonitoringState, Orchestrator, OrchestratorConfig};
pub use stats::{StatsSnapshot, StatsTracker};
pub use warm_set::WarmSet;
