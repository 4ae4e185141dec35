//! Publish worker pool
//!
//! A fixed set of long-lived workers draining the submission queue. All
//! workers are spawned together at pipeline start so the first burst of
//! records never pays pool-warmup latency. Workers never retry: the
//! ingestion client owns retry/backoff, and one completion notification per
//! task goes to the reporter either way.

use std::sync::Arc;

use crossfire::MAsyncRx;
use tokio::task::JoinHandle;

use crate::client::IngestClient;
use crate::reporter::CompletionReporter;
use crate::task::PublishTask;

/// Spawn `count` workers sharing one queue receiver
///
/// Returns the join handles; the controller awaits them during the
/// shutdown drain.
pub(crate) fn spawn_workers(
    count: usize,
    rx: MAsyncRx<PublishTask>,
    client: Arc<dyn IngestClient>,
    destination: Arc<str>,
    reporter: CompletionReporter,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker_id| {
            let rx = rx.clone();
            let client = Arc::clone(&client);
            let destination = Arc::clone(&destination);
            let reporter = reporter.clone();

            tokio::spawn(worker_loop(worker_id, rx, client, destination, reporter))
        })
        .collect()
}

/// One worker: claim, publish, report, repeat
///
/// Exits when the queue is closed and drained (`recv` disconnects). A
/// worker blocked mid-publish past the drain deadline is aborted by the
/// controller.
async fn worker_loop(
    worker_id: usize,
    rx: MAsyncRx<PublishTask>,
    client: Arc<dyn IngestClient>,
    destination: Arc<str>,
    reporter: CompletionReporter,
) {
    tracing::debug!(worker_id, destination = %destination, "publish worker starting");

    while let Ok(task) = rx.recv().await {
        reporter.record_claimed();

        let (payload, partition_key) = task.into_parts();
        match client
            .publish(&destination, payload, partition_key.as_deref())
            .await
        {
            Ok(()) => reporter.record_success(),
            Err(e) => reporter.record_failure(&e),
        }
    }

    tracing::debug!(worker_id, "publish worker stopped");
}
