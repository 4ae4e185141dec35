//! Pipeline configuration
//!
//! A validated, immutable snapshot of the four dispatch tunables. All four
//! must be positive; validation happens at configuration time, before the
//! pipeline starts, never at runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Default queue capacity (records buffered while workers publish)
pub const DEFAULT_BUFFER_SIZE: usize = 2000;

/// Default number of publish workers
pub const DEFAULT_WORKER_COUNT: usize = 20;

/// Default graceful-drain deadline on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default max-retry hint passed to the ingestion client
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tunables for the dispatch pipeline
///
/// Created once at configuration time and never mutated afterward.
///
/// # Example
///
/// ```
/// use logship::PipelineConfig;
///
/// let config = PipelineConfig::new()
///     .with_buffer_size(500)
///     .with_worker_count(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Queue capacity; producers block once this many records are pending
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Number of persistent publish workers, all started together
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Seconds to wait for the queue to drain on shutdown before
    /// abandoning pending records
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Max-retry hint for the ingestion client's own retry policy;
    /// the pipeline itself never retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl PipelineConfig {
    /// Create a config with default tunables
    pub fn new() -> Self {
        Self::default()
    }

    /// Set queue capacity
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set worker count
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set shutdown drain deadline in seconds
    #[must_use]
    pub fn with_shutdown_timeout_secs(mut self, secs: u64) -> Self {
        self.shutdown_timeout_secs = secs;
        self
    }

    /// Set the max-retry hint for the ingestion client
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Shutdown deadline as a `Duration`
    #[inline]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Validate that all tunables are positive
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Configuration` naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(PipelineError::Configuration(
                "buffer_size must be > 0".into(),
            ));
        }
        if self.worker_count == 0 {
            return Err(PipelineError::Configuration(
                "worker_count must be > 0".into(),
            ));
        }
        if self.shutdown_timeout_secs == 0 {
            return Err(PipelineError::Configuration(
                "shutdown_timeout_secs must be > 0".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(PipelineError::Configuration(
                "max_retries must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
