//! Score worker: drains the recalculation queue in the background.
//!
//! Mutating requests enqueue tasks and never wait; this worker runs the
//! matching calculator for each task, logs failures, and moves on. There is
//! no retry and no backoff: a failed recalculation leaves the previous score
//! in place until the next trigger.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use cadence_core::{
    defaults::EVENT_BUS_CAPACITY, Error, RecalcKind, RecalcReceiver, RecalcTask, Result,
};
use cadence_db::Database;

use crate::bonus::BonusCalculator;
use crate::busyness::BusynessCalculator;
use crate::calculators_from_database;

/// Configuration for the score worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether to process tasks at all.
    pub enabled: bool,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_capacity: EVENT_BUS_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `RECALC_WORKER_ENABLED` | `true` | Enable/disable task processing |
    pub fn from_env() -> Self {
        let enabled = std::env::var("RECALC_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Enable or disable task processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the score worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A recalculation task was picked up.
    TaskStarted { user: Uuid, kind: RecalcKind },
    /// A recalculation task completed successfully.
    TaskCompleted { user: Uuid, kind: RecalcKind },
    /// A recalculation task failed; the error was logged and swallowed.
    TaskFailed {
        user: Uuid,
        kind: RecalcKind,
        error: String,
    },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Background worker consuming the recalculation queue.
pub struct ScoreWorker {
    busyness: BusynessCalculator,
    bonus: BonusCalculator,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl ScoreWorker {
    /// Create a worker over explicit calculators.
    pub fn new(busyness: BusynessCalculator, bonus: BonusCalculator, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            busyness,
            bonus,
            config,
            event_tx,
        }
    }

    /// Create a worker wired to a PostgreSQL [`Database`].
    pub fn from_database(db: &Database, config: WorkerConfig) -> Self {
        let (busyness, bonus) = calculators_from_database(db);
        Self::new(busyness, bonus, config)
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the worker on the queue's consumer half and return a handle
    /// for control.
    pub fn start(self, receiver: RecalcReceiver) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(receiver, shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Run the worker loop until shutdown or queue closure.
    #[instrument(skip(self, receiver, shutdown_rx))]
    async fn run(self, mut receiver: RecalcReceiver, mut shutdown_rx: mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Score worker is disabled, not starting");
            return;
        }

        info!(subsystem = "jobs", component = "worker", "Score worker started");
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Score worker received shutdown signal");
                    break;
                }
                task = receiver.recv() => match task {
                    Some(task) => self.execute(task).await,
                    None => {
                        info!("Recalculation queue closed; score worker stopping");
                        break;
                    }
                }
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!(subsystem = "jobs", component = "worker", "Score worker stopped");
    }

    /// Execute a single task. Failures are logged and swallowed; the caller
    /// that triggered the recalculation never observes them.
    async fn execute(&self, task: RecalcTask) {
        let start = Instant::now();
        let _ = self.event_tx.send(WorkerEvent::TaskStarted {
            user: task.user,
            kind: task.kind,
        });

        let result = match task.kind {
            RecalcKind::Busyness => self
                .busyness
                .compute_and_store(task.user, task.day)
                .await
                .map(|_| ()),
            RecalcKind::Bonus => self
                .bonus
                .compute_and_store(task.user, task.day)
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => {
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    user_id = %task.user,
                    task_kind = %task.kind,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Recalculation completed"
                );
                let _ = self.event_tx.send(WorkerEvent::TaskCompleted {
                    user: task.user,
                    kind: task.kind,
                });
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    user_id = %task.user,
                    task_kind = %task.kind,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Recalculation failed"
                );
                let _ = self.event_tx.send(WorkerEvent::TaskFailed {
                    user: task.user,
                    kind: task.kind,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.event_capacity, EVENT_BUS_CAPACITY);
    }

    #[test]
    fn test_worker_config_with_enabled() {
        let config = WorkerConfig::default().with_enabled(false);
        assert!(!config.enabled);
    }

    #[test]
    fn test_worker_event_clone_and_debug() {
        let user = Uuid::new_v4();
        let event = WorkerEvent::TaskFailed {
            user,
            kind: RecalcKind::Bonus,
            error: "storage unavailable".to_string(),
        };
        let cloned = event.clone();
        let debug_str = format!("{:?}", cloned);
        assert!(debug_str.contains("TaskFailed"));
        assert!(debug_str.contains("Bonus"));
    }
}
