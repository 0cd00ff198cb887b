//! Domain Ports (Port/Adapter Pattern)
//!
//! Value objects shared by every layer, plus the traits (ports) the
//! orchestrator depends on. Infrastructure adapters implement these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │ PredictionSource │ ResourceLoader │ PersistenceStore │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │ TransitionPredictor │ SimulatedLoader │ FileStore    │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Value Objects
// =============================================================================

/// Opaque identifier of a loadable resource (an inference model).
///
/// Always non-empty; construct through [`ResourceId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidResourceId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Category of anticipated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    CodeGen,
    Math,
    Writing,
    Analysis,
    Conversation,
    Summarization,
}

impl TaskType {
    /// Every task type, in declaration order
    pub const ALL: [TaskType; 6] = [
        TaskType::CodeGen,
        TaskType::Math,
        TaskType::Writing,
        TaskType::Analysis,
        TaskType::Conversation,
        TaskType::Summarization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::CodeGen => "code_gen",
            TaskType::Math => "math",
            TaskType::Writing => "writing",
            TaskType::Analysis => "analysis",
            TaskType::Conversation => "conversation",
            TaskType::Summarization => "summarization",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownTaskType(s.to_string()))
    }
}

/// A single prediction: the task type expected next and how likely it is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    task_type: TaskType,
    probability: f64,
}

impl Forecast {
    /// Create a forecast; rejects probabilities outside [0, 1] (and NaN).
    pub fn new(task_type: TaskType, probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidProbability(probability));
        }
        Ok(Self {
            task_type,
            probability,
        })
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

// =============================================================================
// Prediction Port
// =============================================================================

/// Port for the component that forecasts upcoming work.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Ranked forecasts for the next interval, descending by probability.
    async fn predict_next(&self) -> Result<Vec<Forecast>>;

    /// Feedback: a task of this type was actually observed.
    async fn record_task_observed(&self, task_type: TaskType);
}

// =============================================================================
// Loader Port
// =============================================================================

/// Port for materializing a resource into a ready state.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load the resource. The error is only ever logged by the orchestrator.
    async fn load(&self, id: &ResourceId) -> Result<()>;
}

// =============================================================================
// Persistence Port
// =============================================================================

/// Port for opaque blob storage of the warm set.
///
/// `Ok(None)` means nothing has been stored yet.
pub trait PersistenceStore: Send + Sync {
    fn load_blob(&self) -> Result<Option<Vec<u8>>>;

    fn save_blob(&self, blob: &[u8]) -> Result<()>;
}

// =============================================================================
// Tests
// =============================================================================
