//! Error types for the pre-warming orchestrator

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while predicting, loading or persisting warm resources
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Domain Validation Errors
    // =========================================================================
    /// Resource identifiers must be non-empty
    #[error("Invalid resource identifier: {0:?}")]
    InvalidResourceId(String),

    /// Forecast probability outside [0, 1]
    #[error("Invalid forecast probability {0}: must be within [0, 1]")]
    InvalidProbability(f64),

    /// Unknown task type name
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// Resource loader reported a failure
    #[error("Failed to load resource {resource}: {reason}")]
    LoadFailed { resource: String, reason: String },

    /// Resource loader did not finish in time
    #[error("Loading resource {resource} timed out after {duration:?}")]
    LoadTimeout { resource: String, duration: Duration },

    /// Prediction source could not produce forecasts
    #[error("Prediction source unavailable: {0}")]
    PredictionUnavailable(String),

    /// Persistence store read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request on the HTTP surface
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Prometheus registry or encoding failure
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Tests
// =============================================================================
