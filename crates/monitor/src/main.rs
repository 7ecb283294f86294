//! Predictive Maintenance Monitor - Main Entry Point

use monitor::{init_logging, run, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("MONITOR_CONFIG"))
        .map(PathBuf::from);

    let config = AppConfig::load(config_path.as_deref())?;
    init_logging(config.log_format);

    info!("=== ML Predictive Maintenance Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Broker {}:{}, sensor topic {}",
        config.mqtt.broker_host, config.mqtt.broker_port, config.mqtt.sensor_topic
    );

    run(config).await
}
