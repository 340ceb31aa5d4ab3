//! maintd: periodic maintenance daemon
//!
//! Runs the engine sweep (due preventive plans, then an alert recompute)
//! on a fixed interval until interrupted.

use anyhow::Result;
use chrono::Utc;
use engine::{init_logging, EngineConfig, MaintenanceEngine};
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = EngineConfig::load()?;
    let interval = Duration::from_secs(config.sweep_interval_secs);
    let engine = MaintenanceEngine::new(config);

    info!("maintd started, sweeping every {}s", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.sweep(Utc::now().date_naive()) {
                    Ok(report) => info!(
                        "Sweep done: {} orders created, alerts {} created / {} updated / {} closed",
                        report.orders_created.len(),
                        report.alerts_created,
                        report.alerts_updated,
                        report.alerts_closed
                    ),
                    Err(e) => error!("Sweep failed: {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}
