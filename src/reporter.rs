//! Completion reporter
//!
//! Receives exactly one completion notification per publish task and folds
//! it into the shared counters. Failures are forwarded to the host's
//! diagnostic sink; they are never propagated back to the caller of
//! `append`, which returned long before the asynchronous outcome was known.

use std::sync::Arc;

use crate::client::ClientError;
use crate::diag::DiagnosticSink;
use crate::metrics::PipelineMetrics;

/// Per-task completion accounting, shared by all workers
#[derive(Clone)]
pub struct CompletionReporter {
    /// Shared counters
    metrics: Arc<PipelineMetrics>,

    /// Host error channel
    diag: Arc<dyn DiagnosticSink>,

    /// Destination name for failure messages
    destination: Arc<str>,
}

impl CompletionReporter {
    /// Create a reporter for the given destination
    pub fn new(
        metrics: Arc<PipelineMetrics>,
        diag: Arc<dyn DiagnosticSink>,
        destination: Arc<str>,
    ) -> Self {
        Self {
            metrics,
            diag,
            destination,
        }
    }

    /// Record that a worker claimed a task from the queue
    #[inline]
    pub fn record_claimed(&self) {
        self.metrics.record_claimed();
    }

    /// Record a successful publish
    #[inline]
    pub fn record_success(&self) {
        self.metrics.record_success();
    }

    /// Record a failed publish and forward it to the diagnostic sink
    pub fn record_failure(&self, cause: &ClientError) {
        self.metrics.record_failure();

        tracing::debug!(
            destination = %self.destination,
            error = %cause,
            "publish failed"
        );
        self.diag.report_error(
            &format!(
                "failed to publish log record to destination '{}'",
                self.destination
            ),
            Some(cause),
        );
    }
}

impl std::fmt::Debug for CompletionReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionReporter")
            .field("destination", &self.destination)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Sink that records messages for assertions
    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    impl DiagnosticSink for RecordingSink {
        fn report_error(&self, message: &str, _cause: Option<&dyn std::error::Error>) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn reporter() -> (CompletionReporter, Arc<PipelineMetrics>, Arc<RecordingSink>) {
        let metrics = Arc::new(PipelineMetrics::new());
        let sink = Arc::new(RecordingSink::default());
        let reporter = CompletionReporter::new(
            Arc::clone(&metrics),
            sink.clone() as Arc<dyn DiagnosticSink>,
            Arc::from("app-logs"),
        );
        (reporter, metrics, sink)
    }

    #[test]
    fn test_success_only_touches_counter() {
        let (reporter, metrics, sink) = reporter();

        reporter.record_success();
        reporter.record_success();

        assert_eq!(metrics.success_count(), 2);
        assert_eq!(metrics.failure_count(), 0);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_reports_to_sink() {
        let (reporter, metrics, sink) = reporter();

        reporter.record_failure(&ClientError::Service("throttled".into()));

        assert_eq!(metrics.failure_count(), 1);
        let reported = sink.0.lock().unwrap();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].contains("app-logs"));
    }

    #[test]
    fn test_concurrent_completions() {
        use std::thread;

        let (reporter, metrics, _sink) = reporter();
        let mut handles = vec![];

        for _ in 0..4 {
            let r = reporter.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    r.record_claimed();
                    r.record_success();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.success_count(), 2000);
        assert_eq!(metrics.in_flight(), 0);
    }
}
