//! Recurring sweep task.
//!
//! Decouples "when to check" (this runner) from "what to do" (the engine's
//! evaluation plus the dispatcher consuming the bus), so each side is
//! testable on its own.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use scalekeeper_events::EventBus;
use scalekeeper_ledger::LedgerStore;

use crate::due::DueEvent;
use crate::engine::ScheduleEngine;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct SweepRunnerConfig {
    /// Time between full sweeps.
    pub interval: Duration,
    /// Name for logging.
    pub name: String,
}

impl Default for SweepRunnerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            name: "schedule-sweep".to_string(),
        }
    }
}

/// Runner statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SweepStats {
    pub sweeps_run: u64,
    pub events_published: u64,
    pub sweep_failures: u64,
}

/// Handle to control a running sweep.
#[derive(Debug)]
pub struct SweepRunnerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<SweepStats>>,
}

impl SweepRunnerHandle {
    /// Request graceful shutdown and wait for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    pub fn stats(&self) -> SweepStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

/// Spawn the recurring sweep in a background thread.
///
/// Each pass evaluates every household and publishes the resulting due
/// events on the bus. A failed pass is logged and retried on the next tick,
/// never escalated: evaluation is idempotent and nothing is lost.
pub fn spawn_sweep<S, B>(
    engine: Arc<ScheduleEngine<S>>,
    bus: Arc<B>,
    config: SweepRunnerConfig,
) -> SweepRunnerHandle
where
    S: LedgerStore + 'static,
    B: EventBus<DueEvent> + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let stats = Arc::new(Mutex::new(SweepStats::default()));
    let stats_clone = stats.clone();

    let name = config.name.clone();
    let join = thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            info!(runner = %config.name, "sweep runner started");

            loop {
                match engine.sweep(Utc::now()) {
                    Ok(events) => {
                        let mut published = 0u64;
                        for event in events {
                            match bus.publish(event) {
                                Ok(()) => published += 1,
                                Err(e) => {
                                    error!(runner = %config.name, error = ?e, "failed to publish due event")
                                }
                            }
                        }
                        if let Ok(mut s) = stats_clone.lock() {
                            s.sweeps_run += 1;
                            s.events_published += published;
                        }
                    }
                    Err(e) => {
                        warn!(runner = %config.name, error = %e, "sweep pass failed");
                        if let Ok(mut s) = stats_clone.lock() {
                            s.sweeps_run += 1;
                            s.sweep_failures += 1;
                        }
                    }
                }

                // Shutdown-aware interval wait.
                match shutdown_rx.recv_timeout(config.interval) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
            }

            info!(runner = %config.name, "sweep runner stopped");
        })
        .expect("failed to spawn sweep runner thread");

    SweepRunnerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
        stats,
    }
}
