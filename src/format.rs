//! Record formatting seam
//!
//! The pipeline never interprets log events itself; a `RecordFormatter`
//! collaborator turns a host event into a byte payload, and an optional
//! `PayloadTransform` rewrites the payload before it is queued. A record
//! whose formatting fails is dropped with a diagnostic, nothing is enqueued.

use thiserror::Error;

/// Error produced while formatting or transforming a record
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FormatError(String);

impl FormatError {
    /// Create a new format error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Turns a host log event into a byte payload
///
/// Implementations are provided by the host (a layout, an encoder, a
/// serializer). The pipeline treats the result as opaque bytes.
pub trait RecordFormatter<E>: Send + Sync {
    /// Format one event into a payload
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if the event cannot be rendered; that single
    /// record is dropped.
    fn format(&self, event: &E) -> Result<Vec<u8>, FormatError>;
}

/// Any `Fn(&E) -> Result<Vec<u8>, FormatError>` is a formatter
impl<E, F> RecordFormatter<E> for F
where
    F: Fn(&E) -> Result<Vec<u8>, FormatError> + Send + Sync,
{
    fn format(&self, event: &E) -> Result<Vec<u8>, FormatError> {
        self(event)
    }
}

/// Rewrites a formatted payload before it is queued
///
/// Applied after `RecordFormatter::format`. Used for payload enveloping
/// (see [`crate::envelope::JsonEnvelope`]).
pub trait PayloadTransform: Send + Sync {
    /// Transform the payload, consuming the original
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if the payload cannot be transformed; that
    /// single record is dropped.
    fn apply(&self, payload: Vec<u8>) -> Result<Vec<u8>, FormatError>;

    /// Transform name for logging
    fn name(&self) -> &'static str;
}
