//! Submission queue with blocking backpressure
//!
//! A fixed-capacity, insertion-ordered buffer of pending publish tasks,
//! backed by a bounded MPMC channel so that every worker drains the same
//! queue. When the queue is full, `put` waits for space instead of dropping
//! or rejecting: log producers tolerate a momentary stall better than
//! silent data loss. Once shutdown begins, blocked and future `put` calls
//! fail immediately with [`PipelineError::Stopped`].

use std::sync::Arc;

use crossfire::{MAsyncRx, MAsyncTx, TrySendError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::task::PublishTask;

/// Bounded FIFO queue between producers and the worker pool
///
/// # Design
///
/// - Capacity is fixed for the pipeline's lifetime
/// - Producers go through [`put`](Self::put); workers clone a receiver via
///   [`receiver`](Self::receiver) and claim tasks with `recv`
/// - The sender lives behind a `Mutex<Option<...>>`; closing the queue takes
///   it, so workers see end-of-stream once the remaining tasks are drained
/// - Admission accounting lives in [`PipelineMetrics`], keeping
///   [`depth`](Self::depth) observable without touching the channel
pub struct SubmissionQueue {
    /// Producer side; taken on close so the channel disconnects after drain
    tx: Mutex<Option<MAsyncTx<PublishTask>>>,

    /// Worker side, cloned per worker
    rx: MAsyncRx<PublishTask>,

    /// Signals blocked producers that shutdown has begun
    shutdown: CancellationToken,

    /// Fixed capacity
    capacity: usize,

    /// Shared admission/claim counters
    metrics: Arc<PipelineMetrics>,
}

impl SubmissionQueue {
    /// Create a queue with the given fixed capacity
    pub fn new(capacity: usize, metrics: Arc<PipelineMetrics>) -> Self {
        let (tx, rx) = crossfire::mpmc::bounded_async::<PublishTask>(capacity);

        Self {
            tx: Mutex::new(Some(tx)),
            rx,
            shutdown: CancellationToken::new(),
            capacity,
            metrics,
        }
    }

    /// Enqueue a task, waiting if the queue is full
    ///
    /// The fast path is a non-blocking `try_send`; only a full queue pays
    /// for the awaited send, and that wait is recorded as a backpressure
    /// event.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Stopped`] if shutdown has begun, including
    /// while this call is blocked waiting for space.
    pub async fn put(&self, task: PublishTask) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(PipelineError::Stopped);
        }

        // Clone the sender out of the lock; the guard must not be held
        // across the awaited send below.
        let tx = match self.tx.lock().await.as_ref() {
            Some(tx) => tx.clone(),
            None => return Err(PipelineError::Stopped),
        };

        match tx.try_send(task) {
            Ok(()) => {
                self.metrics.record_enqueued();
                Ok(())
            }
            Err(TrySendError::Full(task)) => {
                self.metrics.record_backpressure();

                tokio::select! {
                    biased;

                    _ = self.shutdown.cancelled() => Err(PipelineError::Stopped),

                    result = tx.send(task) => match result {
                        Ok(()) => {
                            self.metrics.record_enqueued();
                            Ok(())
                        }
                        Err(_) => Err(PipelineError::Stopped),
                    },
                }
            }
            Err(TrySendError::Disconnected(_)) => Err(PipelineError::Stopped),
        }
    }

    /// Clone a receiver for one worker
    pub(crate) fn receiver(&self) -> MAsyncRx<PublishTask> {
        self.rx.clone()
    }

    /// Number of queued-but-unclaimed tasks
    ///
    /// Observable without blocking; tasks currently being published by a
    /// worker are not counted.
    #[inline]
    pub fn depth(&self) -> u64 {
        self.metrics.queue_depth()
    }

    /// Fixed capacity of the queue
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the queue has been closed for admission
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop admitting tasks
    ///
    /// Fails all blocked and future `put` calls, then drops the sender so
    /// workers observe end-of-stream once the queue is drained. Tasks
    /// already queued remain claimable.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.tx.lock().await.take();
    }
}

impl std::fmt::Debug for SubmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionQueue")
            .field("capacity", &self.capacity)
            .field("depth", &self.depth())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
