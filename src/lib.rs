//! logship - Bounded asynchronous log dispatch
//!
//! Ships application log records to a remote, rate-limited ingestion stream
//! with low caller-visible latency, tolerating transient outages of the
//! service.
//!
//! # Architecture
//!
//! ```text
//! [Producers]                [Pipeline]                     [Workers]
//!   append() ──→ format ──→ bounded queue ──→ claim ──→ IngestClient.publish
//!      │          │  (blocks when full,           │             │
//!      │          └─ optional JSON envelope)      │             ▼
//!      └── returns as soon as the task            └──→ CompletionReporter
//!          is admitted                                  (counters + diagnostics)
//! ```
//!
//! # Key Design
//!
//! - **Blocking backpressure**: a full queue stalls the producer instead of
//!   dropping records; losing log data is worse than bounded latency
//! - **Pre-started worker pool**: all workers spawn at `start()`, so the
//!   first burst of records pays no warmup latency
//! - **Bounded shutdown**: `stop()` drains the queue up to a configured
//!   deadline, then abandons the remainder and reports the loss once
//! - **Capability seams**: the ingestion client, record formatter, payload
//!   transform, and diagnostic sink are all traits; retry/backoff and
//!   credentials live entirely in the client
//! - **Never crash the host**: every failure is recovered locally and
//!   reported through the diagnostic sink
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logship::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::builder()
//!     .config(PipelineConfig::new().with_buffer_size(500).with_worker_count(4))
//!     .destination("app-logs")
//!     .formatter(|event: &String| Ok(event.as_bytes().to_vec()))
//!     .client(Arc::new(my_kinesis_client))
//!     .build()?;
//!
//! pipeline.start().await;
//! pipeline.append(&"user signed in".to_string()).await?;
//! let summary = pipeline.stop().await;
//! assert!(summary.graceful);
//! ```

mod client;
mod config;
mod diag;
mod envelope;
mod error;
mod format;
mod metrics;
mod pipeline;
mod queue;
mod reporter;
mod state;
mod task;
mod worker;

pub use client::{ClientError, DestinationStatus, IngestClient};
pub use config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
    DEFAULT_WORKER_COUNT, PipelineConfig,
};
pub use diag::{DiagnosticSink, TracingSink};
pub use envelope::JsonEnvelope;
pub use error::{PipelineError, Result};
pub use format::{FormatError, PayloadTransform, RecordFormatter};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{DrainSummary, Pipeline, PipelineBuilder};
pub use queue::SubmissionQueue;
pub use reporter::CompletionReporter;
pub use state::PipelineState;
pub use task::{KeyStrategy, PublishTask};
