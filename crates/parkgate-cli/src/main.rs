//! `parkgate`: runs the parking controller on simulated peripherals.
//!
//! ```text
//! parkgate [CONFIG.json]
//! ```
//!
//! Without a configuration file the built-in defaults are used. Runtime
//! parameters are persisted to the file named by `PARKGATE_PARAMS`, if set.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use parkgate_controller::store::{JsonFileStore, MemoryStore};
use parkgate_controller::telemetry::ChannelSink;
use parkgate_controller::{ParkingController, Peripherals};
use parkgate_core::ControllerConfig;
use parkgate_network::{TelemetryClient, TelemetryClientConfig};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scheduler period.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ControllerConfig::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ControllerConfig::default(),
    };

    // Handles stay alive so the mock devices keep reporting as connected.
    let (peripherals, _handles) = Peripherals::mock(config.slot_count);

    let mut builder = ParkingController::builder().with_peripherals(peripherals);
    builder = match std::env::var_os("PARKGATE_PARAMS") {
        Some(path) => builder.with_store(JsonFileStore::new(path)),
        None => builder.with_store(MemoryStore::new()),
    };

    let telemetry = if config.telemetry.enabled {
        let (sink, rx) = ChannelSink::new(config.telemetry.queue_capacity);
        builder = builder.with_sink(sink);
        let client = TelemetryClient::new(TelemetryClientConfig::from(&config.telemetry));
        info!(collector = %config.telemetry.addr, "Telemetry enabled");
        Some(client.spawn(rx))
    } else {
        None
    };

    let mut controller = builder
        .with_config(config)
        .build(Instant::now().into_std())
        .context("failed to start parking controller")?;

    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            now = interval.tick() => controller.tick(now.into_std()),
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for shutdown signal")?;
                info!("Shutdown requested");
                break;
            }
        }
    }

    // Dropping the controller closes the telemetry channel.
    drop(controller);
    if let Some(task) = telemetry {
        let stats = task.await.context("telemetry task failed")?;
        info!(sent = stats.sent, dropped = stats.dropped, "Telemetry flushed");
    }

    Ok(())
}
