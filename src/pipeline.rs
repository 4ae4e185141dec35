//! Pipeline controller
//!
//! Owns the lifecycle state machine (`start`/`append`/`stop`) and the
//! timed graceful-drain shutdown. One controller replaces the original
//! family of near-duplicate appender variants: the ingestion client, record
//! formatter, payload transform, and diagnostic sink are all capability
//! seams, so synchronous and asynchronous clients and enveloped payloads
//! share this single implementation.
//!
//! # Lifecycle
//!
//! ```text
//! Unstarted ──start()──→ Running ──stop()──→ Draining ──→ Stopped
//!      │                    │
//!      └──(bad config /     └──append(): format → transform → key
//!          destination      │            → queue.put (blocks when full)
//!          not ready)       ▼
//!          Failed      workers: claim → publish → report
//! ```
//!
//! `Failed` is terminal: every subsequent `append` is rejected with a
//! descriptive error and one diagnostic, the host process is never aborted.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::IngestClient;
use crate::config::PipelineConfig;
use crate::diag::{DiagnosticSink, TracingSink};
use crate::error::{PipelineError, Result};
use crate::format::{PayloadTransform, RecordFormatter};
use crate::metrics::PipelineMetrics;
use crate::queue::SubmissionQueue;
use crate::reporter::CompletionReporter;
use crate::state::{AtomicState, PipelineState};
use crate::task::{KeyStrategy, PublishTask};
use crate::worker::spawn_workers;

/// Outcome of the shutdown drain protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    /// Whether all workers finished before the drain deadline
    pub graceful: bool,

    /// Records abandoned, queued or in flight, when `stop` returned
    pub abandoned: u64,
}

/// Builder for [`Pipeline`]
///
/// The ingestion client is required at build time; formatter and
/// destination are checked at `start`, mirroring the lifecycle of the
/// logging frameworks this pipeline plugs into (a misconfigured appender
/// must construct, fail to start, and reject records without crashing the
/// host).
pub struct PipelineBuilder<E> {
    config: PipelineConfig,
    destination: Option<String>,
    formatter: Option<Arc<dyn RecordFormatter<E>>>,
    transform: Option<Arc<dyn PayloadTransform>>,
    client: Option<Arc<dyn IngestClient>>,
    diag: Arc<dyn DiagnosticSink>,
    key_strategy: KeyStrategy,
}

impl<E> PipelineBuilder<E> {
    /// Create a builder with default config, tracing diagnostics, and
    /// random-UUID partition keys
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            destination: None,
            formatter: None,
            transform: None,
            client: None,
            diag: Arc::new(TracingSink),
            key_strategy: KeyStrategy::default(),
        }
    }

    /// Set the dispatch tunables
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the destination stream name
    #[must_use]
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set the record formatter
    #[must_use]
    pub fn formatter(mut self, formatter: impl RecordFormatter<E> + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Set an optional payload transform applied after formatting
    #[must_use]
    pub fn transform(mut self, transform: impl PayloadTransform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Set the ingestion client
    #[must_use]
    pub fn client(mut self, client: Arc<dyn IngestClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the diagnostic sink (defaults to [`TracingSink`])
    #[must_use]
    pub fn diagnostic_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diag = sink;
        self
    }

    /// Set the partition key strategy (defaults to random UUIDs)
    #[must_use]
    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Configuration` if any tunable is zero or no
    /// ingestion client was provided.
    pub fn build(self) -> Result<Pipeline<E>> {
        self.config.validate()?;

        let client = self.client.ok_or_else(|| {
            PipelineError::Configuration("no ingestion client configured".into())
        })?;

        let metrics = Arc::new(PipelineMetrics::new());
        let queue = SubmissionQueue::new(self.config.buffer_size, Arc::clone(&metrics));

        Ok(Pipeline {
            config: self.config,
            destination: self.destination.map(Arc::from),
            formatter: self.formatter,
            transform: self.transform,
            client,
            diag: self.diag,
            key_strategy: self.key_strategy,
            state: AtomicState::new(PipelineState::Unstarted),
            queue,
            metrics,
            workers: Mutex::new(Vec::new()),
        })
    }
}

impl<E> Default for PipelineBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded asynchronous dispatch pipeline
///
/// See the [module docs](self) for the lifecycle. Share across producers
/// with an `Arc`; `append` takes `&self` and may be called from any number
/// of tasks concurrently.
pub struct Pipeline<E> {
    /// Validated tunables, immutable after construction
    config: PipelineConfig,

    /// Destination stream name; checked non-empty at start
    destination: Option<Arc<str>>,

    /// Record formatter; checked present at start
    formatter: Option<Arc<dyn RecordFormatter<E>>>,

    /// Optional payload transform applied after formatting
    transform: Option<Arc<dyn PayloadTransform>>,

    /// Ingestion client, read-only-shared across workers
    client: Arc<dyn IngestClient>,

    /// Host error channel
    diag: Arc<dyn DiagnosticSink>,

    /// Partition key assignment
    key_strategy: KeyStrategy,

    /// Lifecycle state, mutated only by this controller
    state: AtomicState,

    /// Bounded submission queue
    queue: SubmissionQueue,

    /// Completion and admission counters
    metrics: Arc<PipelineMetrics>,

    /// Worker join handles, populated at start and drained at stop
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<E> Pipeline<E> {
    /// Create a builder
    pub fn builder() -> PipelineBuilder<E> {
        PipelineBuilder::new()
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state.load()
    }

    /// Completion and admission counters
    #[inline]
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Successful publishes so far
    #[inline]
    pub fn success_count(&self) -> u64 {
        self.metrics.success_count()
    }

    /// Failed publishes so far
    #[inline]
    pub fn failure_count(&self) -> u64 {
        self.metrics.failure_count()
    }

    /// Tasks queued but not yet claimed by a worker
    #[inline]
    pub fn queue_depth(&self) -> u64 {
        self.queue.depth()
    }

    /// Configured tunables
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn destination_name(&self) -> &str {
        self.destination.as_deref().unwrap_or("<unconfigured>")
    }

    /// Start the pipeline
    ///
    /// Checks, in order: a formatter is configured, a destination is
    /// configured, and the destination reports a publishable status. Any
    /// failure leaves the pipeline in `Failed` with one diagnostic reported
    /// and zero workers spawned; the host is never aborted and subsequent
    /// `append` calls are rejected individually. On success all workers are
    /// spawned up front and the state becomes `Running`.
    ///
    /// Returns the resulting state. `start` and `stop` are driven by the
    /// host's lifecycle and must not race each other.
    pub async fn start(&self) -> PipelineState {
        let current = self.state.load();
        if current != PipelineState::Unstarted {
            tracing::warn!(state = %current, "start called on a pipeline that is not unstarted");
            return current;
        }

        if self.formatter.is_none() {
            return self.fail_start("invalid configuration: no record formatter configured", None);
        }

        let destination = match &self.destination {
            Some(d) if !d.is_empty() => Arc::clone(d),
            _ => {
                return self
                    .fail_start("invalid configuration: no destination configured", None);
            }
        };

        match self.client.describe(&destination).await {
            Ok(status) if status.is_publishable() => {
                tracing::debug!(
                    destination = %destination,
                    status = %status,
                    "destination readiness check passed"
                );
            }
            Ok(status) => {
                return self.fail_start(
                    &format!("destination '{destination}' is not ready (status: {status})"),
                    None,
                );
            }
            Err(e) => {
                return self.fail_start(
                    &format!("failed to verify destination '{destination}'"),
                    Some(&e),
                );
            }
        }

        let reporter = CompletionReporter::new(
            Arc::clone(&self.metrics),
            Arc::clone(&self.diag),
            Arc::clone(&destination),
        );
        let handles = spawn_workers(
            self.config.worker_count,
            self.queue.receiver(),
            Arc::clone(&self.client),
            Arc::clone(&destination),
            reporter,
        );
        *self.workers.lock().await = handles;

        self.state.store(PipelineState::Running);
        tracing::info!(
            destination = %destination,
            buffer_size = self.config.buffer_size,
            worker_count = self.config.worker_count,
            shutdown_timeout_secs = self.config.shutdown_timeout_secs,
            "pipeline started"
        );
        PipelineState::Running
    }

    fn fail_start(
        &self,
        message: &str,
        cause: Option<&dyn std::error::Error>,
    ) -> PipelineState {
        self.state.store(PipelineState::Failed);
        self.diag.report_error(message, cause);
        PipelineState::Failed
    }

    /// Format and enqueue one record
    ///
    /// Blocks (asynchronously) while the queue is full; returns as soon as
    /// the task is admitted. The publish outcome is reported later through
    /// the completion reporter, never to this caller.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NotStarted`] before `start`
    /// - [`PipelineError::DestinationUnavailable`] in `Failed` state; the
    ///   record is dropped, nothing is enqueued
    /// - [`PipelineError::Format`] if formatting or the payload transform
    ///   fails; that one record is dropped
    /// - [`PipelineError::Stopped`] once shutdown has begun, including for
    ///   calls blocked on a full queue
    pub async fn append(&self, event: &E) -> Result<()> {
        match self.state.load() {
            PipelineState::Running => {}
            PipelineState::Unstarted => return Err(PipelineError::NotStarted),
            PipelineState::Failed => {
                self.metrics.record_rejected();
                let err = PipelineError::DestinationUnavailable {
                    destination: self.destination_name().to_string(),
                    reason: "pipeline failed to initialize; check the configuration and \
                             whether the destination exists and is active"
                        .into(),
                };
                self.diag.report_error(&err.to_string(), None);
                return Err(err);
            }
            PipelineState::Draining | PipelineState::Stopped => {
                self.metrics.record_rejected();
                return Err(PipelineError::Stopped);
            }
        }

        // Running implies both were validated at start
        let (Some(formatter), Some(destination)) = (&self.formatter, &self.destination) else {
            return Err(PipelineError::NotStarted);
        };

        let payload = match formatter.format(event) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_rejected();
                self.diag.report_error(
                    &format!("failed to format record for destination '{destination}'"),
                    Some(&e),
                );
                return Err(e.into());
            }
        };

        let payload = match &self.transform {
            Some(transform) => match transform.apply(payload) {
                Ok(payload) => payload,
                Err(e) => {
                    self.metrics.record_rejected();
                    self.diag.report_error(
                        &format!(
                            "{} transform failed for destination '{destination}'",
                            transform.name()
                        ),
                        Some(&e),
                    );
                    return Err(e.into());
                }
            },
            None => payload,
        };

        let task = PublishTask::new(Bytes::from(payload), self.key_strategy.next_key());
        match self.queue.put(task).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.metrics.record_rejected();
                Err(e)
            }
        }
    }

    /// Stop the pipeline, draining queued work up to the configured deadline
    ///
    /// In order: admission is closed (blocked and future `append`s fail
    /// fast), workers are signalled that no new work will arrive, then the
    /// controller waits up to `shutdown_timeout` for the drain. Workers
    /// still busy at the deadline are aborted and the abandoned-record
    /// count is reported as a single diagnostic. Always returns within the
    /// configured timeout regardless of queue depth.
    pub async fn stop(&self) -> DrainSummary {
        if !self
            .state
            .transition(PipelineState::Running, PipelineState::Draining)
        {
            // Never started (or failed to): nothing to drain. A concurrent
            // or repeated stop already owns the drain.
            if matches!(
                self.state.load(),
                PipelineState::Unstarted | PipelineState::Failed
            ) {
                self.state.store(PipelineState::Stopped);
            }
            return DrainSummary {
                graceful: true,
                abandoned: 0,
            };
        }

        tracing::info!(
            destination = %self.destination_name(),
            queued = self.queue.depth(),
            in_flight = self.metrics.in_flight(),
            timeout_secs = self.config.shutdown_timeout_secs,
            "pipeline draining"
        );

        self.queue.close().await;

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.workers.lock().await;
            guard.drain(..).collect()
        };

        let deadline = Instant::now() + self.config.shutdown_timeout();
        let mut graceful = true;
        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "worker task panicked during drain");
                }
                Err(_) => {
                    graceful = false;
                    handle.abort();
                }
            }
        }

        let snapshot = self.metrics.snapshot();
        let abandoned = snapshot
            .records_enqueued
            .saturating_sub(snapshot.publish_success + snapshot.publish_failure);

        if abandoned > 0 {
            self.metrics.record_abandoned(abandoned);
            let message = if graceful {
                format!(
                    "abandoned {} pending log record(s) for destination '{}'",
                    abandoned,
                    self.destination_name()
                )
            } else {
                format!(
                    "shutdown drain deadline of {}s elapsed; abandoned {} pending log \
                     record(s) for destination '{}'",
                    self.config.shutdown_timeout_secs,
                    abandoned,
                    self.destination_name()
                )
            };
            self.diag.report_error(&message, None);
        }

        self.state.store(PipelineState::Stopped);
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            destination = %self.destination_name(),
            publish_success = snapshot.publish_success,
            publish_failure = snapshot.publish_failure,
            backpressure_events = snapshot.backpressure_events,
            records_rejected = snapshot.records_rejected,
            records_abandoned = snapshot.records_abandoned,
            graceful,
            "pipeline stopped"
        );

        DrainSummary { graceful, abandoned }
    }
}

impl<E> std::fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("destination", &self.destination_name())
            .field("state", &self.state.load())
            .field("queue_depth", &self.queue.depth())
            .finish()
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
