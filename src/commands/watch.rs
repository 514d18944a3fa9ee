use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::core::config::MonitorConfig;
use crate::core::telemetry::{Snapshot, TelemetryEngine, TelemetryRuntime};
use crate::ui::format_snapshot;

/// Options for the `watch` command
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Overrides the configured poll interval
    pub interval_ms: Option<u64>,
    pub json: bool,
    /// Stop after this many snapshots
    pub count: Option<u64>,
}

/// Poll in the background and print every new snapshot.
pub fn execute(config: &MonitorConfig, options: &WatchOptions) -> Result<()> {
    let mut config = config.clone();
    if let Some(ms) = options.interval_ms {
        config.poll_interval_ms = ms;
    }
    let interval = config.poll_interval();

    let runtime = TelemetryRuntime::spawn(interval, move || TelemetryEngine::detect(&config))
        .context("Failed to start telemetry polling")?;

    // Ctrl+C must still reach `runtime.shutdown()` so backends are released.
    let (cancel_tx, mut cancel_rx) = mpsc::unbounded_channel::<()>();
    ctrlc::set_handler(move || {
        let _ = cancel_tx.send(());
    })
    .context("Failed to set Ctrl+C handler")?;

    let printer = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build output runtime")?;

    let mut snapshot_rx = runtime.snapshot_rx.clone();
    let result = printer.block_on(print_until_cancelled(
        &mut snapshot_rx,
        &mut cancel_rx,
        interval,
        options.count,
        |snapshot| print_snapshot(snapshot, options.json),
    ));

    runtime.shutdown();
    result.map(|printed| log::debug!("Printed {} snapshots", printed))
}

/// Hand every new snapshot to `emit` until `count` is reached or a
/// cancellation arrives. Returns how many snapshots were emitted.
async fn print_until_cancelled<T: Clone + std::borrow::Borrow<Snapshot>>(
    snapshot_rx: &mut watch::Receiver<T>,
    cancel_rx: &mut mpsc::UnboundedReceiver<()>,
    interval: Duration,
    count: Option<u64>,
    mut emit: impl FnMut(&Snapshot) -> Result<()>,
) -> Result<u64> {
    let stall = interval * 10 + Duration::from_secs(5);
    let mut printed = 0u64;
    while count.is_none_or(|limit| printed < limit) {
        tokio::select! {
            biased;
            Some(()) = cancel_rx.recv() => {
                log::info!("Interrupted, stopping telemetry polling");
                break;
            }
            changed = tokio::time::timeout(stall, snapshot_rx.changed()) => match changed {
                Ok(changed) => changed.context("Telemetry polling stopped unexpectedly")?,
                Err(_) => {
                    // Slow backends are not fatal; keep waiting.
                    log::warn!("No snapshot received within {:?}", stall);
                    continue;
                }
            },
        }
        let snapshot = snapshot_rx.borrow_and_update().clone();
        emit(snapshot.borrow())?;
        printed += 1;
    }
    Ok(printed)
}

fn print_snapshot(snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}\n", format_snapshot(snapshot));
    }
    Ok(())
}
