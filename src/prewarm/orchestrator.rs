//! Pre-warming Orchestrator
//!
//! Owns the warm set, the mapping table and the statistics, runs the
//! prediction cycle on demand or on a timer, and mediates every call to the
//! prediction source and the resource loader.
//!
//! # Concurrency
//!
//! Cycles serialize on an async mutex, so two cycles never interleave.
//! Short mutations (`record_usage`, `update_mapping`, `register_preference`)
//! take synchronous locks that are never held across an `.await`. The only
//! point where external work rejoins core state is the insert after a load
//! completes.
//!
//! The warm set is encoded while locked and written to the store afterwards
//! on the blocking pool. Only cycles mutate it, so writes land in cycle
//! order.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::adapters::TimeoutLoader;
use crate::domain::{PersistenceStore, PredictionSource, ResourceId, ResourceLoader, TaskType};
use crate::error::{Error, Result};

use super::eviction::{EvictionPolicy, DEFAULT_CAPACITY};
use super::filter::{PredictionFilter, DEFAULT_MAX_CANDIDATES, DEFAULT_MINIMUM_PROBABILITY};
use super::mapping::MappingTable;
use super::stats::{StatsSnapshot, StatsTracker};
use super::warm_set::WarmSet;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wait between the end of one timed cycle and the start of the next
    pub check_interval: Duration,

    /// Forecasts below this probability are ignored
    pub minimum_probability: f64,

    /// Forecasts considered per cycle
    pub max_candidates: usize,

    /// Warm set size bound at rest
    pub capacity: usize,

    /// Per-load time limit; `None` trusts the loader to bound itself
    pub load_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            minimum_probability: DEFAULT_MINIMUM_PROBABILITY,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            capacity: DEFAULT_CAPACITY,
            load_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl OrchestratorConfig {
    /// Reject settings under which the capacity bound cannot hold.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be at least 1".to_string()));
        }
        if self.max_candidates == 0 {
            return Err(Error::Config("max_candidates must be at least 1".to_string()));
        }
        if self.max_candidates > self.capacity {
            return Err(Error::Config(format!(
                "max_candidates ({}) must not exceed capacity ({})",
                self.max_candidates, self.capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.minimum_probability) {
            return Err(Error::Config(format!(
                "minimum_probability {} is outside [0, 1]",
                self.minimum_probability
            )));
        }
        if self.check_interval.is_zero() {
            return Err(Error::Config("check_interval must be non-zero".to_string()));
        }
        if self.load_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config("load_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Monitoring State
// =============================================================================

/// Whether the periodic loop is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringState {
    Stopped,
    Monitoring,
}

impl std::fmt::Display for MonitoringState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitoringState::Stopped => write!(f, "stopped"),
            MonitoringState::Monitoring => write!(f, "monitoring"),
        }
    }
}

struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Predictive pre-warming orchestrator
pub struct Orchestrator {
    config: OrchestratorConfig,
    filter: PredictionFilter,
    eviction: EvictionPolicy,

    predictor: Arc<dyn PredictionSource>,
    loader: Arc<dyn ResourceLoader>,

    warm_set: Mutex<WarmSet>,
    store: Arc<dyn PersistenceStore>,
    mapping: RwLock<Arc<MappingTable>>,
    stats: StatsTracker,

    /// Held for the whole of a cycle
    cycle_lock: tokio::sync::Mutex<()>,

    monitor: Mutex<Option<MonitorHandle>>,

    /// Usage feedback bound for the prediction source
    feedback_tx: mpsc::UnboundedSender<TaskType>,
}

impl Orchestrator {
    /// Create an orchestrator, restoring the warm set from `store`.
    ///
    /// Must be called from within a Tokio runtime: the feedback forwarder is
    /// spawned here.
    pub fn new(
        config: OrchestratorConfig,
        predictor: Arc<dyn PredictionSource>,
        loader: Arc<dyn ResourceLoader>,
        store: Arc<dyn PersistenceStore>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let loader: Arc<dyn ResourceLoader> = match config.load_timeout {
            Some(limit) => Arc::new(TimeoutLoader::new(loader, limit)),
            None => loader,
        };

        let eviction = EvictionPolicy::new(config.capacity);
        let mut warm_set = WarmSet::restore(store.as_ref());

        // A previous session may have run with a larger capacity
        let surplus = eviction.select_victims(warm_set.iter(), &[]);
        if !surplus.is_empty() {
            for id in &surplus {
                info!(resource = %id, "Dropping restored entry over capacity");
                warm_set.remove(id);
            }
            if let Err(e) = warm_set.to_blob().and_then(|blob| store.save_blob(&blob)) {
                warn!("Failed to persist trimmed warm set: {}", e);
            }
        }

        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_feedback(Arc::clone(&predictor), feedback_rx));

        info!(
            capacity = config.capacity,
            restored = warm_set.len(),
            "Pre-warming orchestrator initialized"
        );

        Ok(Arc::new(Self {
            filter: PredictionFilter::new(config.minimum_probability, config.max_candidates),
            eviction,
            config,
            predictor,
            loader,
            warm_set: Mutex::new(warm_set),
            store,
            mapping: RwLock::new(Arc::new(MappingTable::new())),
            stats: StatsTracker::new(),
            cycle_lock: tokio::sync::Mutex::new(()),
            monitor: Mutex::new(None),
            feedback_tx,
        }))
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the periodic loop. A no-op if it is already running.
    ///
    /// The first cycle runs immediately, then one per `check_interval`.
    pub fn start(self: &Arc<Self>) {
        let mut monitor = self.monitor.lock();
        if monitor.is_some() {
            info!("Prediction monitoring already running");
            return;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(monitor_loop(
            Arc::downgrade(self),
            cancel.clone(),
            self.config.check_interval,
        ));
        *monitor = Some(MonitorHandle { cancel, task });

        info!(interval = ?self.config.check_interval, "Prediction monitoring started");
    }

    /// Stop the periodic loop. A no-op if it is not running.
    ///
    /// A cycle already in flight finishes; no further cycle starts.
    pub fn stop(&self) {
        match self.monitor.lock().take() {
            Some(handle) => {
                handle.cancel.cancel();
                drop(handle.task);
                info!("Prediction monitoring stopped");
            }
            None => debug!("Prediction monitoring not running"),
        }
    }

    pub fn state(&self) -> MonitoringState {
        if self.monitor.lock().is_some() {
            MonitoringState::Monitoring
        } else {
            MonitoringState::Stopped
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.state() == MonitoringState::Monitoring
    }

    // =========================================================================
    // Cycle
    // =========================================================================

    /// Run one prediction cycle and wait for it to finish.
    ///
    /// Best effort: prediction and load failures are logged and counted,
    /// never returned.
    #[instrument(skip(self))]
    pub async fn check_predictions(&self) {
        let _cycle = self.cycle_lock.lock().await;
        self.stats.record_check();

        let forecasts = match self.predictor.predict_next().await {
            Ok(forecasts) => forecasts,
            Err(e) => {
                warn!("Prediction source failed: {}", e);
                return;
            }
        };
        if forecasts.is_empty() {
            debug!("No forecasts this cycle");
            return;
        }

        let mapping = self.mapping();
        let priority = self.filter.select(&forecasts, &mapping);
        if priority.is_empty() {
            debug!(
                forecasts = forecasts.len(),
                "No forecast cleared the threshold with a mapped resource"
            );
            return;
        }
        debug!(?priority, "Priority list");

        for id in &priority {
            let already_warm = self.warm_set.lock().contains(id);
            if already_warm {
                continue;
            }

            self.stats.record_preload_attempt();
            match self.loader.load(id).await {
                Ok(()) => {
                    let blob = {
                        let mut warm_set = self.warm_set.lock();
                        warm_set.insert(id.clone()).then(|| warm_set.to_blob())
                    };
                    self.stats.record_preload_success();
                    info!(resource = %id, "Resource pre-warmed");
                    if let Some(blob) = blob {
                        self.persist(blob).await;
                    }
                }
                Err(e) => {
                    warn!(resource = %id, "Pre-warm failed: {}", e);
                }
            }
        }

        self.evict(&priority).await;
    }

    async fn evict(&self, priority: &[ResourceId]) {
        let victims = {
            let warm_set = self.warm_set.lock();
            self.eviction.select_victims(warm_set.iter(), priority)
        };

        for id in victims {
            let blob = {
                let mut warm_set = self.warm_set.lock();
                warm_set.remove(&id).then(|| warm_set.to_blob())
            };
            if let Some(blob) = blob {
                self.stats.record_eviction();
                info!(resource = %id, "Evicted warm resource");
                self.persist(blob).await;
            }
        }
    }

    /// Write an encoded warm set off the async workers.
    ///
    /// Failures leave the in-memory set authoritative.
    async fn persist(&self, blob: Result<Vec<u8>>) {
        let blob = match blob {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to encode warm set: {}", e);
                return;
            }
        };

        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.save_blob(&blob)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to persist warm set: {}", e),
            Err(e) => warn!("Warm set write task failed: {}", e),
        }
    }

    // =========================================================================
    // Mapping
    // =========================================================================

    /// Replace the whole mapping table.
    pub fn update_mapping(&self, table: MappingTable) {
        debug!(entries = table.len(), "Mapping table replaced");
        *self.mapping.write() = Arc::new(table);
    }

    /// Add or replace a single mapping entry, keeping the rest.
    pub fn register_preference(&self, task_type: TaskType, id: ResourceId) {
        let mut mapping = self.mapping.write();
        let next = mapping.with_entry(task_type, id);
        *mapping = Arc::new(next);
    }

    pub fn get_preferred_resource(&self, task_type: TaskType) -> Option<ResourceId> {
        self.mapping.read().resolve(task_type).cloned()
    }

    /// Current mapping snapshot
    pub fn mapping(&self) -> Arc<MappingTable> {
        Arc::clone(&self.mapping.read())
    }

    // =========================================================================
    // Warm Set & Usage
    // =========================================================================

    pub fn get_warm_resources(&self) -> BTreeSet<ResourceId> {
        self.warm_set.lock().all()
    }

    pub fn is_warm(&self, id: &ResourceId) -> bool {
        self.warm_set.lock().contains(id)
    }

    /// Record that `id` served a task of `task_type`.
    ///
    /// Counts a successful prediction when `id` is warm, and forwards the
    /// task type to the prediction source without waiting on it.
    pub fn record_usage(&self, id: &ResourceId, task_type: TaskType) {
        let was_warm = self.is_warm(id);
        self.stats.record_usage(was_warm);
        debug!(resource = %id, task = %task_type, was_warm, "Usage recorded");

        if self.feedback_tx.send(task_type).is_err() {
            warn!("Prediction feedback channel closed");
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.get_mut().take() {
            handle.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Background Tasks
// =============================================================================

/// Cycle, wait, repeat until cancelled or the orchestrator is dropped.
async fn monitor_loop(
    orchestrator: Weak<Orchestrator>,
    cancel: CancellationToken,
    interval: Duration,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let Some(this) = orchestrator.upgrade() else {
            break;
        };
        this.check_predictions().await;
        drop(this);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Prediction monitoring loop exited");
}

async fn forward_feedback(
    predictor: Arc<dyn PredictionSource>,
    mut rx: mpsc::UnboundedReceiver<TaskType>,
) {
    while let Some(task_type) = rx.recv().await {
        predictor.record_task_observed(task_type).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
