//! Prewarmer
//!
//! Runs the pre-warming orchestrator as a standalone service with the
//! built-in transition predictor, a simulated model loader and a file-backed
//! warm set. Clients train the predictor by reporting what they used:
//!
//! ```text
//! curl -X POST 'http://localhost:8080/usage?resource=codeModel&task=code_gen'
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Prewarmer                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │  Transition  │───▶│ Orchestrator │───▶│    Loader    │       │
//! │  │  Predictor   │    │   (Brain)    │    │   (Hands)    │       │
//! │  │   (Eyes)     │    │              │    │              │       │
//! │  └──────────────┘    └──────────────┘    └──────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prewarmer::adapters::{FilePersistenceStore, SimulatedLoader, TransitionPredictor};
use prewarmer::{server, MappingTable, Orchestrator, OrchestratorConfig, PrewarmMetrics};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Prewarmer - keeps likely-needed inference models loaded ahead of demand
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seconds between prediction cycles
    #[arg(long, env = "PREWARM_INTERVAL_SECS", default_value = "60")]
    interval_secs: u64,

    /// Maximum number of warm resources
    #[arg(long, env = "PREWARM_CAPACITY", default_value = "2")]
    capacity: usize,

    /// Forecasts considered per cycle
    #[arg(long, env = "PREWARM_MAX_CANDIDATES", default_value = "2")]
    max_candidates: usize,

    /// Minimum forecast probability to act on
    #[arg(long, env = "PREWARM_MIN_PROBABILITY", default_value = "0.25")]
    min_probability: f64,

    /// Per-load timeout in seconds (0 disables)
    #[arg(long, env = "PREWARM_LOAD_TIMEOUT_SECS", default_value = "300")]
    load_timeout_secs: u64,

    /// Latency of the simulated loader in milliseconds
    #[arg(long, env = "PREWARM_SIMULATED_LOAD_MS", default_value = "500")]
    simulated_load_ms: u64,

    /// Where the warm set is persisted
    #[arg(long, env = "PREWARM_STATE_FILE", default_value = "prewarm-state.json")]
    state_file: PathBuf,

    /// YAML file mapping task types to resource identifiers
    #[arg(long, env = "PREWARM_MAPPING_FILE")]
    mapping_file: Option<PathBuf>,

    /// Metrics/health server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            check_interval: Duration::from_secs(self.interval_secs),
            minimum_probability: self.min_probability,
            max_candidates: self.max_candidates,
            capacity: self.capacity,
            load_timeout: (self.load_timeout_secs > 0)
                .then(|| Duration::from_secs(self.load_timeout_secs)),
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("Starting Prewarmer");
    info!("  Check interval: {}s", args.interval_secs);
    info!("  Capacity: {}", args.capacity);
    info!("  Minimum probability: {}", args.min_probability);
    info!("  State file: {}", args.state_file.display());

    let predictor = Arc::new(TransitionPredictor::default());
    let loader = Arc::new(SimulatedLoader::new(Duration::from_millis(
        args.simulated_load_ms,
    )));
    let store = Arc::new(FilePersistenceStore::new(&args.state_file));

    let orchestrator = Orchestrator::new(args.orchestrator_config(), predictor, loader, store)
        .context("invalid orchestrator configuration")?;

    if let Some(path) = &args.mapping_file {
        let table = load_mapping(path)?;
        info!("Loaded {} mapping entries from {}", table.len(), path.display());
        orchestrator.update_mapping(table);
    }

    let metrics = Arc::new(PrewarmMetrics::new().context("failed to register metrics")?);

    // Start metrics, health and usage server
    let metrics_addr = args.metrics_addr.clone();
    let server_orchestrator = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        if let Err(e) = server::serve(&metrics_addr, server_orchestrator, metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    orchestrator.start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    orchestrator.stop();

    let stats = orchestrator.stats();
    info!(
        checks = stats.checks_performed,
        preloads = stats.successful_preloads,
        hit_rate = stats.hit_rate(),
        "Prewarmer shutdown complete"
    );
    Ok(())
}

fn load_mapping(path: &Path) -> anyhow::Result<MappingTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read mapping file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse mapping file {}", path.display()))
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?);

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
    Ok(())
}
