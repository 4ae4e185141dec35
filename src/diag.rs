//! Diagnostic sink
//!
//! All non-fatal operational errors (failed publishes, shutdown data loss,
//! configuration errors) are routed to the host's error channel through the
//! `DiagnosticSink` trait. Nothing reported here ever unwinds back into the
//! caller of `append` or terminates the host process.

/// Receives non-fatal operational errors from the pipeline
pub trait DiagnosticSink: Send + Sync {
    /// Report one operational error
    ///
    /// Must not panic; called concurrently from all workers.
    fn report_error(&self, message: &str, cause: Option<&dyn std::error::Error>);
}

/// Default sink that forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report_error(&self, message: &str, cause: Option<&dyn std::error::Error>) {
        match cause {
            Some(cause) => tracing::error!(error = %cause, "{}", message),
            None => tracing::error!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let sink = TracingSink;
        sink.report_error("something failed", None);

        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        sink.report_error("something else failed", Some(&cause));
    }
}
