//! pumpguard - Predictive Maintenance Dashboard
//!
//! Serves forecasts, fault probabilities, reliability KPIs and SPC charts
//! for a pump/valve system while replaying its sensor history.
//!
//! # Usage
//!
//! ```bash
//! # Replay data/Cleared_df0.csv with models from models/
//! cargo run --release
//!
//! # Synthetic dataset, fast replay, start immediately
//! cargo run --release -- --synthetic 2000 --interval-secs 0.5 --autostart
//! ```
//!
//! # Environment Variables
//!
//! - `PUMPGUARD_CONFIG`: Path to a TOML config file
//! - `PUMPGUARD_SERVER_ADDR`: Bind address (default: 0.0.0.0:5000)
//! - `PUMPGUARD_CORS_ORIGINS`: Comma-separated allowed origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use axum::Router;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use pumpguard::api::create_app;
use pumpguard::config::DashboardConfig;
use pumpguard::data::{load_csv, HistoryStore, SyntheticGenerator};
use pumpguard::models::ModelStore;
use pumpguard::types::ObservationRow;
use pumpguard::DashboardState;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pumpguard")]
#[command(about = "Pump/valve predictive maintenance dashboard")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:5000")
    #[arg(short, long, env = "PUMPGUARD_SERVER_ADDR")]
    addr: Option<String>,

    /// Path to the history CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Generate N synthetic rows instead of reading the CSV
    #[arg(long, value_name = "N")]
    synthetic: Option<usize>,

    /// Seed for --synthetic
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Seconds between simulated observations
    #[arg(long)]
    interval_secs: Option<f64>,

    /// Rows visible at startup
    #[arg(long)]
    start_index: Option<usize>,

    /// Start the simulation as soon as the server is up
    #[arg(long)]
    autostart: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl CliArgs {
    /// Layer CLI overrides on top of the file/default config.
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(addr) = &self.addr {
            config.server.addr.clone_from(addr);
        }
        if let Some(csv) = &self.csv {
            config.data.csv_path.clone_from(csv);
        }
        if let Some(interval) = self.interval_secs {
            config.simulation.interval_secs = interval;
        }
        if let Some(start) = self.start_index {
            config.simulation.start_index = start;
        }
        if self.autostart {
            config.simulation.autostart = true;
        }
    }
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    Simulation,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::Simulation => write!(f, "Simulation"),
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Load the history CSV or generate a synthetic one. A missing or broken
/// CSV leaves the dashboard running with no data.
fn load_rows(config: &DashboardConfig, synthetic: Option<usize>, seed: u64) -> Vec<ObservationRow> {
    let now = Utc::now().naive_utc();

    if let Some(count) = synthetic {
        info!("🎲 Generating {} synthetic rows (seed {})", count, seed);
        return SyntheticGenerator::new(seed).generate(count, now);
    }

    info!("📂 Loading history from CSV: {}", config.data.csv_path.display());
    match load_csv(&config.data.csv_path, now) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "History unavailable, starting with an empty dataset");
            Vec::new()
        }
    }
}

/// Serve the API until the shutdown token fires.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel_token.cancelled().await })
            .await
            .context("dashboard server stopped unexpectedly")?;

        info!(task = %TaskName::HttpServer, "Dashboard server drained");
        Ok(TaskName::HttpServer)
    });
}

/// Wait on the dashboard tasks. The first failure cancels the rest; after
/// shutdown the remaining tasks are drained before returning.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut failure = None;
    let mut draining = false;

    loop {
        let joined = tokio::select! {
            joined = task_set.join_next() => joined,
            () = cancel_token.cancelled(), if !draining => {
                info!(pending = task_set.len(), "Shutdown requested, draining tasks");
                draining = true;
                continue;
            }
        };
        let Some(joined) = joined else { break };

        match joined {
            Ok(Ok(task)) => info!(task = %task, "Task finished"),
            Ok(Err(e)) => {
                error!(error = %e, "Task failed, stopping the dashboard");
                failure.get_or_insert(e);
            }
            Err(e) => {
                error!(error = %e, "Task panicked, stopping the dashboard");
                failure.get_or_insert_with(|| anyhow::anyhow!("task panicked: {e}"));
            }
        }
        if failure.is_some() && !draining {
            cancel_token.cancel();
            draining = true;
        }
    }

    failure.map_or(Ok(()), Err)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let mut config = DashboardConfig::load();
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  pumpguard - Predictive Maintenance Dashboard");
    info!("  Forecasts · Fault probabilities · Reliability KPIs · SPC");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");

    let rows = load_rows(&config, args.synthetic, args.seed);
    let history = Arc::new(HistoryStore::new(rows, config.simulation.start_index));
    let window = history.snapshot();
    info!(
        "📊 {} rows loaded, {} visible at start",
        window.total_rows(),
        window.current_index()
    );

    let models = Arc::new(ModelStore::load(&config.models.forecast_dir, &config.models.breakdown_dir));
    info!(
        "🧠 Models: {} forecast regressors, breakdown classifier {}",
        models.forecast.registry.len(),
        if models.breakdown.classifier.is_some() { "loaded" } else { "missing" }
    );
    info!(
        "⏱️  Simulation interval: {:?}, inference timeout: {:?}",
        config.simulation.interval(),
        config.inference.timeout()
    );

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let config = Arc::new(config);
    let state = DashboardState::new(history, models, Arc::clone(&config), cancel_token.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!("🌐 Dashboard: http://{}", config.server.addr);

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task 1: HTTP Server
    spawn_http_server(&mut task_set, listener, create_app(state.clone()), cancel_token.clone());

    // Task 2: Simulation clock
    let simulation = Arc::clone(&state.simulation);
    let autostart = config.simulation.autostart;
    task_set.spawn(async move {
        simulation.run_until_shutdown(autostart).await;
        Ok(TaskName::Simulation)
    });

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("pumpguard stopped");
    Ok(())
}
