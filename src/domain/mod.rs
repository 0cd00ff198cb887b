//! Domain Layer
//!
//! Value objects and the ports the orchestrator talks through.
//!
//! # Usage
//!
//! ```ignore
//! use prewarmer::domain::{PredictionSource, ResourceLoader, ResourceId};
//!
//! async fn warm<P, L>(predictor: &P, loader: &L) -> Result<()>
//! where
//!     P: PredictionSource,
//!     L: ResourceLoader,
//! {
//!     let forecasts = predictor.predict_next().await?;
//!     // ...
//! }
//! ```

pub mod ports;

pub use ports::{
    // Value objects
    Forecast,
    // Port traits
    PersistenceStore,
    PredictionSource,
    ResourceId,
    ResourceLoader,
    TaskType,
};
