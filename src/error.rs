//! Pipeline error types
//!
//! Error types for pipeline lifecycle and dispatch operations.

use thiserror::Error;

use crate::format::FormatError;

/// Errors surfaced by pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid or incomplete configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The destination failed its readiness check or the pipeline
    /// failed to initialize against it
    #[error("destination '{destination}' is not available: {reason}")]
    DestinationUnavailable {
        /// Name of the destination stream
        destination: String,
        /// Why the destination is unusable
        reason: String,
    },

    /// A record could not be formatted; the record is dropped
    #[error("failed to format record: {0}")]
    Format(#[from] FormatError),

    /// `append` was called before `start`
    #[error("pipeline has not been started")]
    NotStarted,

    /// The pipeline has begun shutting down; no new records are admitted
    #[error("pipeline is stopped")]
    Stopped,
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Configuration("buffer_size must be > 0".into());
        assert!(err.to_string().contains("buffer_size"));

        let err = PipelineError::DestinationUnavailable {
            destination: "app-logs".into(),
            reason: "status: deleting".into(),
        };
        assert!(err.to_string().contains("app-logs"));
        assert!(err.to_string().contains("deleting"));

        let err = PipelineError::Format(FormatError::new("bad event"));
        assert!(err.to_string().contains("bad event"));

        let err = PipelineError::NotStarted;
        assert!(err.to_string().contains("not been started"));

        let err = PipelineError::Stopped;
        assert!(err.to_string().contains("stopped"));
    }

    #[test]
    fn test_format_error_conversion() {
        let err: PipelineError = FormatError::new("truncated").into();
        assert!(matches!(err, PipelineError::Format(_)));
    }
}
