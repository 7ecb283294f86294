//! Periodic statistics report

use crate::snapshot::MonitorSnapshot;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Log a statistics summary from a snapshot
pub fn log_statistics(snapshot: &MonitorSnapshot) {
    info!("{}", "=".repeat(60));
    for line in snapshot.summary_lines() {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));
}

/// Log the latest snapshot every `interval` until the sender is dropped
pub async fn run_reporter(mut snapshots: watch::Receiver<MonitorSnapshot>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if snapshots.has_changed().is_err() {
            break;
        }
        let snapshot = snapshots.borrow_and_update().clone();
        log_statistics(&snapshot);
    }
}
