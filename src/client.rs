//! Ingestion client seam
//!
//! The pipeline publishes through an `IngestClient` trait object. The client
//! owns its own retry/backoff policy, connection management, and transport
//! details; the pipeline only hands it payloads and observes outcomes. The
//! `max_retries` tunable in [`crate::PipelineConfig`] is a hint for client
//! construction, it is never acted on inside the pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors reported by an ingestion client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The destination stream does not exist
    #[error("destination not found: {0}")]
    NotFound(String),

    /// The call did not complete within the client's own timeout
    #[error("request timed out")]
    Timeout,

    /// The service rejected or failed the call (after the client's retries)
    #[error("service error: {0}")]
    Service(String),
}

/// Status of a destination stream as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationStatus {
    /// Ready for publishing
    Active,
    /// Resharding/updating; still accepts records
    Updating,
    /// Being created; not yet publishable
    Creating,
    /// Being deleted
    Deleting,
    /// Does not exist
    Missing,
}

impl DestinationStatus {
    /// Whether records can be published to a destination in this status
    ///
    /// `Active` and `Updating` destinations accept records; anything else
    /// fails the readiness check at start.
    #[inline]
    pub fn is_publishable(&self) -> bool {
        matches!(self, Self::Active | Self::Updating)
    }
}

impl std::fmt::Display for DestinationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Updating => "updating",
            Self::Creating => "creating",
            Self::Deleting => "deleting",
            Self::Missing => "missing",
        };
        f.write_str(s)
    }
}

/// Client for a remote ingestion service
///
/// Implement this trait to bind the pipeline to a concrete service SDK.
/// Both a synchronous-under-the-hood and a fully asynchronous client fit
/// behind this seam; the pipeline is parameterized by capability, not by
/// SDK generation.
#[async_trait]
pub trait IngestClient: Send + Sync {
    /// Publish one payload to the destination
    ///
    /// Runs to completion or to the client's own timeout; the pipeline
    /// never retries a failed call at this layer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` once the client's internal retries are
    /// exhausted.
    async fn publish(
        &self,
        destination: &str,
        payload: Bytes,
        partition_key: Option<&str>,
    ) -> Result<(), ClientError>;

    /// Describe the destination's current status
    ///
    /// Invoked once at pipeline start as the readiness check.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the destination cannot be described.
    async fn describe(&self, destination: &str) -> Result<DestinationStatus, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publishable_statuses() {
        assert!(DestinationStatus::Active.is_publishable());
        assert!(DestinationStatus::Updating.is_publishable());
        assert!(!DestinationStatus::Creating.is_publishable());
        assert!(!DestinationStatus::Deleting.is_publishable());
        assert!(!DestinationStatus::Missing.is_publishable());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DestinationStatus::Active.to_string(), "active");
        assert_eq!(DestinationStatus::Missing.to_string(), "missing");
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::NotFound("app-logs".into());
        assert!(err.to_string().contains("app-logs"));

        let err = ClientError::Service("throttled".into());
        assert!(err.to_string().contains("throttled"));
    }
}
