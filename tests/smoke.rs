//! Smoke tests for the dispatch pipeline
//!
//! These tests drive the public API end to end: records appended from
//! concurrent producer tasks flow through format, envelope, and queue to an
//! in-memory ingestion client, and shutdown drains what was admitted.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::{Instant, sleep, timeout};

use logship::{
    ClientError, DestinationStatus, IngestClient, JsonEnvelope, KeyStrategy, Pipeline,
    PipelineConfig, PipelineState,
};

/// Install a subscriber so `RUST_LOG=debug cargo test` shows pipeline logs
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Formatter used by every smoke test
struct LineFormatter;

impl logship::RecordFormatter<String> for LineFormatter {
    fn format(&self, event: &String) -> Result<Vec<u8>, logship::FormatError> {
        Ok(event.as_bytes().to_vec())
    }
}

/// In-memory ingestion client that records every published payload
struct MemoryClient {
    latency: Duration,
    published: Mutex<Vec<(Vec<u8>, Option<String>)>>,
}

impl MemoryClient {
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            published: Mutex::new(Vec::new()),
        }
    }

    fn published(&self) -> Vec<(Vec<u8>, Option<String>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngestClient for MemoryClient {
    async fn publish(
        &self,
        _destination: &str,
        payload: Bytes,
        partition_key: Option<&str>,
    ) -> Result<(), ClientError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        self.published
            .lock()
            .unwrap()
            .push((payload.to_vec(), partition_key.map(String::from)));
        Ok(())
    }

    async fn describe(&self, _destination: &str) -> Result<DestinationStatus, ClientError> {
        Ok(DestinationStatus::Active)
    }
}

#[tokio::test]
async fn test_concurrent_producers_end_to_end() {
    init_tracing();
    let client = Arc::new(MemoryClient::new(Duration::from_millis(1)));

    let pipeline = Arc::new(
        Pipeline::builder()
            .config(
                PipelineConfig::new()
                    .with_buffer_size(32)
                    .with_worker_count(4)
                    .with_shutdown_timeout_secs(10),
            )
            .destination("smoke-logs")
            .formatter(LineFormatter)
            .client(Arc::clone(&client) as Arc<dyn IngestClient>)
            .build()
            .expect("failed to build pipeline"),
    );

    assert_eq!(pipeline.start().await, PipelineState::Running);

    // 4 producer tasks, 25 records each
    let mut producers = Vec::new();
    for producer in 0..4 {
        let pipeline = Arc::clone(&pipeline);
        producers.push(tokio::spawn(async move {
            for i in 0..25 {
                pipeline
                    .append(&format!("producer {producer} record {i}"))
                    .await
                    .expect("append failed");
            }
        }));
    }
    for producer in producers {
        producer.await.expect("producer task panicked");
    }

    // Everything admitted must be delivered by the graceful drain
    let summary = pipeline.stop().await;
    assert!(summary.graceful);
    assert_eq!(summary.abandoned, 0);
    assert_eq!(pipeline.success_count(), 100);
    assert_eq!(pipeline.failure_count(), 0);
    assert_eq!(client.published().len(), 100);

    // Default key strategy assigns a partition key to every record
    assert!(client.published().iter().all(|(_, key)| key.is_some()));
}

#[tokio::test]
async fn test_json_envelope_end_to_end() {
    init_tracing();
    let client = Arc::new(MemoryClient::new(Duration::ZERO));

    let pipeline = Pipeline::builder()
        .config(PipelineConfig::new().with_worker_count(1))
        .destination("smoke-logs")
        .formatter(LineFormatter)
        .transform(
            JsonEnvelope::default()
                .with_tag("service", "smoke")
                .with_tag("env", "test"),
        )
        .key_strategy(KeyStrategy::Fixed("shard-0".into()))
        .client(Arc::clone(&client) as Arc<dyn IngestClient>)
        .build()
        .expect("failed to build pipeline");

    pipeline.start().await;
    pipeline
        .append(&"checkout completed".to_string())
        .await
        .expect("append failed");
    let summary = pipeline.stop().await;
    assert!(summary.graceful);

    let published = client.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1.as_deref(), Some("shard-0"));

    let value: serde_json::Value =
        serde_json::from_slice(&published[0].0).expect("payload is not JSON");
    assert_eq!(value["service"], "smoke");
    assert_eq!(value["env"], "test");
    assert_eq!(value["message"], "checkout completed");
}

#[tokio::test]
async fn test_shutdown_respects_drain_deadline() {
    init_tracing();
    // Publishes take far longer than the drain deadline
    let client = Arc::new(MemoryClient::new(Duration::from_secs(30)));

    let pipeline = Pipeline::builder()
        .config(
            PipelineConfig::new()
                .with_buffer_size(8)
                .with_worker_count(2)
                .with_shutdown_timeout_secs(1),
        )
        .destination("smoke-logs")
        .formatter(LineFormatter)
        .client(client as Arc<dyn IngestClient>)
        .build()
        .expect("failed to build pipeline");

    pipeline.start().await;
    for i in 0..4 {
        pipeline
            .append(&format!("stuck record {i}"))
            .await
            .expect("append failed");
    }

    let stop_started = Instant::now();
    let summary = timeout(Duration::from_secs(5), pipeline.stop())
        .await
        .expect("stop did not return within the drain deadline");

    assert!(stop_started.elapsed() < Duration::from_secs(3));
    assert!(!summary.graceful);
    assert_eq!(summary.abandoned, 4);
    assert_eq!(pipeline.state(), PipelineState::Stopped);
}
