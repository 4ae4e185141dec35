//! Dispatch pipeline metrics
//!
//! Atomic counters for completion accounting and queue observability.
//! All counters are monotonically increasing and use relaxed ordering;
//! derived gauges (queue depth, in-flight) are saturating differences of
//! counters, so they can never underflow under any interleaving.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one dispatch pipeline
///
/// # Thread Safety
///
/// All methods are safe to call from producers and workers concurrently.
/// Values may be slightly stale when read; they are eventually consistent.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Tasks admitted into the submission queue
    records_enqueued: AtomicU64,

    /// Tasks claimed from the queue by a worker
    records_claimed: AtomicU64,

    /// Outbound publish calls that succeeded
    publish_success: AtomicU64,

    /// Outbound publish calls that failed
    publish_failure: AtomicU64,

    /// Times a producer found the queue full and had to wait
    backpressure_events: AtomicU64,

    /// Records rejected before enqueueing (format failures, failed or
    /// stopped pipeline)
    records_rejected: AtomicU64,

    /// Records abandoned when the shutdown drain deadline elapsed
    records_abandoned: AtomicU64,
}

impl PipelineMetrics {
    /// Create a new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_enqueued: AtomicU64::new(0),
            records_claimed: AtomicU64::new(0),
            publish_success: AtomicU64::new(0),
            publish_failure: AtomicU64::new(0),
            backpressure_events: AtomicU64::new(0),
            records_rejected: AtomicU64::new(0),
            records_abandoned: AtomicU64::new(0),
        }
    }

    /// Record a task admitted to the queue
    #[inline]
    pub fn record_enqueued(&self) {
        self.records_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a task claimed by a worker
    #[inline]
    pub fn record_claimed(&self) {
        self.records_claimed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful publish
    #[inline]
    pub fn record_success(&self) {
        self.publish_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed publish
    #[inline]
    pub fn record_failure(&self) {
        self.publish_failure.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a producer waiting on a full queue
    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record rejected before enqueueing
    #[inline]
    pub fn record_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record records abandoned at the shutdown deadline
    #[inline]
    pub fn record_abandoned(&self, count: u64) {
        self.records_abandoned.fetch_add(count, Ordering::Relaxed);
    }

    /// Successful publishes so far
    #[inline]
    pub fn success_count(&self) -> u64 {
        self.publish_success.load(Ordering::Relaxed)
    }

    /// Failed publishes so far
    #[inline]
    pub fn failure_count(&self) -> u64 {
        self.publish_failure.load(Ordering::Relaxed)
    }

    /// Completed publishes, success or failure
    #[inline]
    pub fn completed(&self) -> u64 {
        self.success_count() + self.failure_count()
    }

    /// Tasks enqueued but not yet claimed by any worker
    ///
    /// Tasks currently being published are not counted.
    #[inline]
    pub fn queue_depth(&self) -> u64 {
        self.records_enqueued
            .load(Ordering::Relaxed)
            .saturating_sub(self.records_claimed.load(Ordering::Relaxed))
    }

    /// Tasks claimed by a worker whose publish has not completed
    #[inline]
    pub fn in_flight(&self) -> u64 {
        self.records_claimed
            .load(Ordering::Relaxed)
            .saturating_sub(self.completed())
    }

    /// Get a point-in-time snapshot of all counters
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_enqueued: self.records_enqueued.load(Ordering::Relaxed),
            records_claimed: self.records_claimed.load(Ordering::Relaxed),
            publish_success: self.publish_success.load(Ordering::Relaxed),
            publish_failure: self.publish_failure.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            records_abandoned: self.records_abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Tasks admitted into the submission queue
    pub records_enqueued: u64,
    /// Tasks claimed by workers
    pub records_claimed: u64,
    /// Successful publishes
    pub publish_success: u64,
    /// Failed publishes
    pub publish_failure: u64,
    /// Producer waits on a full queue
    pub backpressure_events: u64,
    /// Records rejected before enqueueing
    pub records_rejected: u64,
    /// Records abandoned at the shutdown deadline
    pub records_abandoned: u64,
}

impl MetricsSnapshot {
    /// Fraction of completed publishes that succeeded (0.0 - 1.0)
    ///
    /// Returns None if nothing has completed yet.
    #[inline]
    pub fn delivery_rate(&self) -> Option<f64> {
        let total = self.publish_success + self.publish_failure;
        if total == 0 {
            None
        } else {
            Some(self.publish_success as f64 / total as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_completion_counters() {
        let metrics = PipelineMetrics::new();

        metrics.record_success();
        metrics.record_success();
        metrics.record_failure();

        assert_eq!(metrics.success_count(), 2);
        assert_eq!(metrics.failure_count(), 1);
        assert_eq!(metrics.completed(), 3);
    }

    #[test]
    fn test_queue_depth() {
        let metrics = PipelineMetrics::new();

        metrics.record_enqueued();
        metrics.record_enqueued();
        metrics.record_enqueued();
        assert_eq!(metrics.queue_depth(), 3);

        metrics.record_claimed();
        assert_eq!(metrics.queue_depth(), 2);
        assert_eq!(metrics.in_flight(), 1);

        metrics.record_success();
        assert_eq!(metrics.in_flight(), 0);
    }

    #[test]
    fn test_gauges_never_underflow() {
        let metrics = PipelineMetrics::new();

        // Claim observed before the matching enqueue increment lands
        metrics.record_claimed();
        assert_eq!(metrics.queue_depth(), 0);

        metrics.record_success();
        metrics.record_success();
        assert_eq!(metrics.in_flight(), 0);
    }

    #[test]
    fn test_abandoned_accumulates() {
        let metrics = PipelineMetrics::new();
        metrics.record_abandoned(4);
        assert_eq!(metrics.snapshot().records_abandoned, 4);
    }

    #[test]
    fn test_delivery_rate() {
        let snapshot = MetricsSnapshot {
            publish_success: 9,
            publish_failure: 1,
            ..Default::default()
        };
        assert_eq!(snapshot.delivery_rate(), Some(0.9));

        assert_eq!(MetricsSnapshot::default().delivery_rate(), None);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(PipelineMetrics::new());
        let mut handles = vec![];

        for _ in 0..4 {
            let m = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    m.record_enqueued();
                    m.record_claimed();
                    m.record_success();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_enqueued, 4000);
        assert_eq!(snapshot.records_claimed, 4000);
        assert_eq!(snapshot.publish_success, 4000);
        assert_eq!(metrics.queue_depth(), 0);
        assert_eq!(metrics.in_flight(), 0);
    }
}
