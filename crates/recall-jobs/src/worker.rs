//! Interval worker that runs reminder sweeps in the background.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use recall_core::{Error, Result};

use crate::sweeper::ReminderSweeper;

/// Capacity of the worker event channel.
const EVENT_CAPACITY: usize = 64;

/// Configuration for the sweep worker.
#[derive(Debug, Clone, Default)]
pub struct SweepWorkerConfig {
    /// Time between sweeps. `None` disables the worker.
    pub interval: Option<Duration>,
}

impl SweepWorkerConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `REMINDER_SWEEP_INTERVAL_SECS` | unset | Seconds between sweeps; unset or `0` disables |
    pub fn from_env() -> Self {
        let interval = std::env::var("REMINDER_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Self { interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn enabled(&self) -> bool {
        self.interval.is_some()
    }
}

/// Event emitted by the sweep worker.
#[derive(Debug, Clone)]
pub enum SweepEvent {
    WorkerStarted,
    SweepCompleted {
        processed: usize,
        sent: usize,
        failed: usize,
        cleaned: u64,
    },
    SweepFailed {
        error: String,
    },
    WorkerStopped,
}

/// Handle for controlling a running sweep worker.
pub struct SweepWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SweepEvent>,
    task: JoinHandle<()>,
}

impl SweepWorkerHandle {
    /// Signal the worker to stop and wait for the in-flight sweep to finish.
    ///
    /// Once this returns the worker no longer touches the store, so the
    /// database pool can be closed.
    pub async fn shutdown(self) -> Result<()> {
        // A closed channel means the task already exited; still join it.
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Sweep worker task failed: {}", e)))
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<SweepEvent> {
        self.event_rx.resubscribe()
    }
}

/// Runs [`ReminderSweeper::sweep`] on a fixed interval.
pub struct SweepWorker {
    sweeper: ReminderSweeper,
    interval: Duration,
    event_tx: broadcast::Sender<SweepEvent>,
}

impl SweepWorker {
    /// Build a worker, or `None` when the config disables it.
    pub fn new(sweeper: ReminderSweeper, config: SweepWorkerConfig) -> Option<Self> {
        let interval = config.interval?;
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Some(Self {
            sweeper,
            interval,
            event_tx,
        })
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> SweepWorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        SweepWorkerHandle {
            shutdown_tx,
            event_rx,
            task,
        }
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!(
            subsystem = "jobs",
            component = "sweep_worker",
            interval_secs = self.interval.as_secs(),
            "Reminder sweep worker started"
        );
        let _ = self.event_tx.send(SweepEvent::WorkerStarted);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(
                        subsystem = "jobs",
                        component = "sweep_worker",
                        "Reminder sweep worker received shutdown signal"
                    );
                    break;
                }
                _ = sleep(self.interval) => {}
            }

            match self.sweeper.sweep(Utc::now()).await {
                Ok(report) => {
                    let _ = self.event_tx.send(SweepEvent::SweepCompleted {
                        processed: report.processed,
                        sent: report.sent_count(),
                        failed: report.failed_count(),
                        cleaned: report.cleaned,
                    });
                }
                Err(e) => {
                    error!(
                        subsystem = "jobs",
                        component = "sweep_worker",
                        error = %e,
                        "Reminder sweep failed"
                    );
                    let _ = self.event_tx.send(SweepEvent::SweepFailed {
                        error: e.to_string(),
                    });
                }
            }
        }

        let _ = self.event_tx.send(SweepEvent::WorkerStopped);
        info!(
            subsystem = "jobs",
            component = "sweep_worker",
            "Reminder sweep worker stopped"
        );
    }
}
