//! Background polling of a [`TelemetryEngine`].
//!
//! The engine lives on a dedicated thread with a current-thread Tokio
//! runtime: OS management handles are thread-affine, so the engine is
//! built, polled and shut down on that one thread. Consumers read the most
//! recent snapshot from a watch channel.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;

use crate::error::{Result, TelemetryError};

use super::engine::TelemetryEngine;
use super::feed::BackendStatus;
use super::snapshot::Snapshot;

pub struct TelemetryRuntime {
    /// Latest snapshot; starts out as an empty default
    pub snapshot_rx: watch::Receiver<Arc<Snapshot>>,

    /// Backend availability, refreshed after every poll
    pub status_rx: watch::Receiver<BackendStatus>,

    shutdown_tx: broadcast::Sender<()>,

    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryRuntime {
    /// Spawn the polling thread. `build_engine` runs on that thread.
    pub fn spawn<F>(interval: Duration, build_engine: F) -> Result<Self>
    where
        F: FnOnce() -> TelemetryEngine + Send + 'static,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::default()));
        let (status_tx, status_rx) = watch::channel(BackendStatus::default());
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        // Subscribe before spawning so an early shutdown is never missed.
        let shutdown_rx = shutdown_tx.subscribe();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| TelemetryError::runtime(format!("Failed to build runtime: {}", e)))?;

        let worker = std::thread::Builder::new()
            .name("telemetry-poll".to_string())
            .spawn(move || {
                let mut engine = build_engine();
                let _ = status_tx.send(engine.get_status());
                runtime.block_on(poll_loop(
                    &mut engine,
                    interval,
                    snapshot_tx,
                    status_tx,
                    shutdown_rx,
                ));
                engine.shutdown();
            })?;

        Ok(Self {
            snapshot_rx,
            status_rx,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn status(&self) -> BackendStatus {
        self.status_rx.borrow().clone()
    }

    /// Stop polling, release backends and join the thread. Safe to call
    /// more than once.
    pub fn shutdown(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        // No receiver means the loop already ended.
        let _ = self.shutdown_tx.send(());
        if worker.join().is_err() {
            log::error!("Telemetry polling thread panicked");
        }
    }
}

impl Drop for TelemetryRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn poll_loop(
    engine: &mut TelemetryEngine,
    interval: Duration,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    status_tx: watch::Sender<BackendStatus>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = engine.get_stats();
                let _ = snapshot_tx.send(Arc::new(snapshot));

                let status = engine.get_status();
                status_tx.send_if_modified(|current| {
                    if *current == status {
                        return false;
                    }
                    *current = status;
                    true
                });
            }
            _ = shutdown.recv() => {
                log::debug!("Telemetry polling stopped");
                break;
            }
        }
    }
}
