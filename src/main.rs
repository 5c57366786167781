//! AntPower - virtual power meter loopback
//!
//! Drives a virtual power meter with a simulated rider and feeds every page
//! it broadcasts back into a state tracker, logging the decoded snapshots.
//! Pass `--scan` to track in scan mode instead of attaching to the emitter.

use antpower::sensors::ant::{channel_period, PowerEmitter, StateTracker, TrackerMode};
use antpower::storage::config::{load_config, AppConfig};
use anyhow::Context;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AntPower v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("loading configuration")?;
    let scan = std::env::args().any(|arg| arg == "--scan");

    run(config, scan).await
}

async fn run(config: AppConfig, scan: bool) -> anyhow::Result<()> {
    let mut emitter = PowerEmitter::from_settings(&config.emitter);
    let mode = if scan {
        TrackerMode::Scan
    } else {
        TrackerMode::Single {
            device_id: emitter.device_id(),
        }
    };
    let mut tracker = StateTracker::new(mode, config.tracker.event_capacity);

    let mut snapshots = tracker.subscribe();
    tokio::spawn(async move {
        while let Ok(snapshot) = snapshots.recv().await {
            match serde_json::to_string(&snapshot) {
                Ok(json) => tracing::info!("{}", json),
                Err(e) => tracing::warn!("Failed to serialize snapshot: {}", e),
            }
        }
    });

    let started = Instant::now();
    let mut update_tick = tokio::time::interval(config.simulation.update_interval());
    let mut transmit_tick = tokio::time::interval(channel_period());

    loop {
        tokio::select! {
            _ = update_tick.tick() => {
                let watts = simulated_power(config.simulation.max_power, started.elapsed().as_secs_f64());
                emitter
                    .set_power(watts, config.simulation.cadence)
                    .context("updating virtual power meter")?;

                if let Some(max_age) = config.tracker.stale_after() {
                    tracker.prune_stale(max_age);
                }
            }
            _ = transmit_tick.tick() => {
                if let Some(payload) = emitter.next_page() {
                    tracing::debug!("TX {:02X?}", payload);
                    tracker.dispatch(emitter.device_id(), &payload);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Smooth effort between zero and `max_power`, one surge every ~12 s.
fn simulated_power(max_power: f64, elapsed_secs: f64) -> f64 {
    max_power.max(0.0) * (0.5 - 0.5 * (elapsed_secs * 0.5).cos())
}
