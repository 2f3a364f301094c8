//! Bounded recalculation queue decoupling mutations from score computation.
//!
//! Mutating operations enqueue a [`RecalcTask`] and return without waiting;
//! a background worker (cadence-jobs) drains the queue and runs the matching
//! calculator. Enqueueing never blocks: when the queue is full the task is
//! dropped and the drop is logged, so fire-and-forget stays observable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::defaults::RECALC_QUEUE_CAPACITY;

/// Which calculator a task targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalcKind {
    Busyness,
    Bonus,
}

impl std::fmt::Display for RecalcKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busyness => write!(f, "busyness"),
            Self::Bonus => write!(f, "bonus"),
        }
    }
}

/// One unit of background recalculation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalcTask {
    pub user: Uuid,
    pub kind: RecalcKind,
    pub day: NaiveDate,
}

/// Producer half of the recalculation queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RecalcQueue {
    tx: mpsc::Sender<RecalcTask>,
}

/// Consumer half of the recalculation queue, held by the worker.
#[derive(Debug)]
pub struct RecalcReceiver {
    rx: mpsc::Receiver<RecalcTask>,
}

impl RecalcQueue {
    /// Create a queue with the default bounded capacity.
    pub fn new() -> (RecalcQueue, RecalcReceiver) {
        Self::with_capacity(RECALC_QUEUE_CAPACITY)
    }

    /// Create a queue with an explicit bounded capacity.
    pub fn with_capacity(capacity: usize) -> (RecalcQueue, RecalcReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (RecalcQueue { tx }, RecalcReceiver { rx })
    }

    /// Enqueue a task without blocking. Returns whether it was accepted;
    /// a full or closed queue drops the task after logging.
    pub fn enqueue(&self, task: RecalcTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                warn!(
                    user_id = %task.user,
                    task_kind = %task.kind,
                    "Recalculation queue full; dropping task"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                warn!(
                    user_id = %task.user,
                    task_kind = %task.kind,
                    "Recalculation queue closed; dropping task"
                );
                false
            }
        }
    }

    /// Enqueue a busyness recalculation for `user` anchored at `day`.
    pub fn enqueue_busyness(&self, user: Uuid, day: NaiveDate) -> bool {
        self.enqueue(RecalcTask {
            user,
            kind: RecalcKind::Busyness,
            day,
        })
    }

    /// Enqueue a bonus recalculation for `user` targeting `day`.
    pub fn enqueue_bonus(&self, user: Uuid, day: NaiveDate) -> bool {
        self.enqueue(RecalcTask {
            user,
            kind: RecalcKind::Bonus,
            day,
        })
    }
}

impl RecalcReceiver {
    /// Receive the next task; `None` when every producer handle is gone.
    pub async fn recv(&mut self) -> Option<RecalcTask> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for drain loops.
    pub fn try_recv(&mut self) -> Option<RecalcTask> {
        self.rx.try_recv().ok()
    }
}
