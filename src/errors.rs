/// Message used when the stream ends or the connection drops before a
/// terminal event was seen.
pub const CONNECTION_CLOSED_MESSAGE: &str = "connection closed unexpectedly";

/// Message used when a remote `error` event arrives without one of its own.
pub const REMOTE_FAILURE_MESSAGE: &str = "verification failed";

/// Message used when a `complete` event carries no verdict payload.
pub const MISSING_RESULT_MESSAGE: &str = "verification completed without a result";

/// Connection-level errors raised by an event source.
///
/// These are fatal to the session: the driver converts them into the session's
/// `error` outcome with a canned message, so callers see the same surface as a
/// remote failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The server rejected the request outright.
    #[error("http error (status {status}): {message}")]
    Http { status: u16, message: String },
    /// The connection failed or dropped mid-stream.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The byte stream violated the record framing beyond recovery.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl SourceError {
    /// Creates an HTTP-level error from a status and response body.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

/// Per-record errors yielded by the event reader.
///
/// `Malformed` is non-fatal: the offending record is dropped and iteration
/// continues. `Source` ends the stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// One record could not be parsed into the event schema.
    #[error("malformed event record: {detail}")]
    Malformed { detail: String },
    /// The underlying source failed; no further events will arrive.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ReadError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    /// Returns true when this error ends the stream.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

/// Top-level error type for the public session API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Blank or otherwise unusable input, rejected before any network activity.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A prior verification session is still running.
    #[error("a verification session is already running")]
    SessionBusy,
    /// The session reached its `error` outcome; carries the session message.
    #[error("verification failed: {0}")]
    Failed(String),
    /// The session was reset before reaching a terminal outcome.
    #[error("session was reset before completion")]
    Cancelled,
    /// Internal invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_read_errors_are_not_fatal() {
        assert!(!ReadError::malformed("bad json").is_fatal());
        assert!(ReadError::Source(SourceError::transport("reset by peer")).is_fatal());
    }

    #[test]
    fn source_error_display_includes_status() {
        let err = SourceError::http(502, "bad gateway");
        assert_eq!(err.to_string(), "http error (status 502): bad gateway");
    }
}
