//! Predictive Maintenance Monitor
//!
//! Subscribes to machine sensor readings over MQTT, learns a baseline of
//! normal operation, then flags and publishes anomalous readings. A periodic
//! statistics report and a read-only status API observe published snapshots.

use anyhow::Context;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use mqtt_bridge::MqttBridge;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub mod pipeline;
pub mod report;
mod routes;
pub mod settings;
pub mod snapshot;

pub use pipeline::{run_monitor, Monitor, ReadingOutcome};
pub use settings::{AppConfig, LogFormat, SettingsError};
pub use snapshot::MonitorSnapshot;

/// Application state shared across handlers
pub struct AppState {
    /// Latest published monitor snapshot
    pub snapshots: watch::Receiver<MonitorSnapshot>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(snapshots: watch::Receiver<MonitorSnapshot>) -> Self {
        Self {
            snapshots,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Create the status API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::get_health))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/machines", get(routes::machines::get_machines))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the status API until the task is aborted
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind status API on {}", addr))?;
    info!("Starting status API on {}", addr);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Initialize logging. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run the monitor until Ctrl-C or until the transport stops delivering.
///
/// Only a failed broker connection at startup is fatal.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    if let Some(addr) = &config.metrics_addr {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("Invalid metrics address: {}", addr))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    }

    let (bridge, inbound) = MqttBridge::connect(&config.mqtt)
        .await
        .context("Failed to connect to MQTT broker")?;
    info!("Connected to MQTT broker");

    let mut monitor = Monitor::new(&config, &bridge)?;
    let (snapshot_tx, snapshot_rx) = watch::channel(monitor.snapshot());

    let reporter = tokio::spawn(report::run_reporter(
        snapshot_rx.clone(),
        Duration::from_secs(config.report.stats_interval_secs),
    ));

    let api = config.api.enabled.then(|| {
        let state = Arc::new(AppState::new(snapshot_rx));
        let addr = config.api.bind_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = serve(&addr, state).await {
                error!("Status API stopped: {:#}", e);
            }
        })
    });

    info!(
        "Monitoring started, training after {} readings. Press Ctrl+C to stop.",
        config.model.min_training_samples
    );
    run_monitor(&mut monitor, inbound, &snapshot_tx, shutdown_signal()).await;

    report::log_statistics(&monitor.snapshot());

    reporter.abort();
    if let Some(api) = api {
        api.abort();
    }
    drop(monitor);
    bridge.shutdown().await;

    Ok(())
}
