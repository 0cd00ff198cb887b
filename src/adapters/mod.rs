//! Infrastructure Adapters
//!
//! Concrete implementations of the domain ports:
//!
//! | Port | Adapter | Use |
//! |------|---------|-----|
//! | `PredictionSource` | [`TransitionPredictor`] | built-in task forecaster |
//! | `ResourceLoader` | [`SimulatedLoader`] | stand-in model runtime |
//! | `ResourceLoader` | [`TimeoutLoader`] | bounds any other loader |
//! | `PersistenceStore` | [`FilePersistenceStore`] | warm set across restarts |
//! | `PersistenceStore` | [`InMemoryPersistenceStore`] | tests, ephemeral runs |

mod loader;
mod persistence;
mod predictor;

pub use loader::{SimulatedLoader, TimeoutLoader};
pub use persistence::{FilePersistenceStore, InMemoryPersistenceStore};
pub use predictor::{TransitionPredictor, DEFAULT_MIN_TRANSITION_SAMPLES};
