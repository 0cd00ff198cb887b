//! Resource Loader Adapters
//!
//! `SimulatedLoader` stands in for a real model runtime; `TimeoutLoader`
//! bounds any loader so a stuck load cannot hold a cycle forever.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::domain::{ResourceId, ResourceLoader};
use crate::error::{Error, Result};

/// Loader that sleeps for a fixed latency and then succeeds, unless the
/// identifier was marked as failing.
#[derive(Debug, Default)]
pub struct SimulatedLoader {
    latency: Duration,
    failing: Mutex<HashSet<ResourceId>>,
    loaded: Mutex<Vec<ResourceId>>,
}

impl SimulatedLoader {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    /// Make every future load of `id` fail
    pub fn fail_on(&self, id: ResourceId) {
        self.failing.lock().insert(id);
    }

    pub fn recover(&self, id: &ResourceId) {
        self.failing.lock().remove(id);
    }

    /// Every identifier passed to `load`, in call order, including failures
    pub fn load_calls(&self) -> Vec<ResourceId> {
        self.loaded.lock().clone()
    }
}

#[async_trait]
impl ResourceLoader for SimulatedLoader {
    #[instrument(skip(self), fields(resource = %id))]
    async fn load(&self, id: &ResourceId) -> Result<()> {
        self.loaded.lock().push(id.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing.lock().contains(id) {
            return Err(Error::LoadFailed {
                resource: id.to_string(),
                reason: "simulated failure".to_string(),
            });
        }

        debug!("Simulated load complete");
        Ok(())
    }
}

/// Decorator failing any load that outlives `limit`.
pub struct TimeoutLoader {
    inner: Arc<dyn ResourceLoader>,
    limit: Duration,
}

impl TimeoutLoader {
    pub fn new(inner: Arc<dyn ResourceLoader>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl ResourceLoader for TimeoutLoader {
    async fn load(&self, id: &ResourceId) -> Result<()> {
        tokio::time::timeout(self.limit, self.inner.load(id))
            .await
            .map_err(|_| Error::LoadTimeout {
                resource: id.to_string(),
                duration: self.limit,
            })?
    }
}

// =============================================================================
// Tests
// =============================================================================
