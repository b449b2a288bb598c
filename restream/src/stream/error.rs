//! Error types for the resumable stream.

use std::io;

use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors surfaced by a resumable download stream.
///
/// Reconnect-internal failures (a refused connection during a retry, a
/// resend that ends before the resume offset) are absorbed by the retry
/// loop and never appear here. Only terminal conditions do: a bad locator
/// or failed connection at construction, or retry-policy exhaustion.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The resource locator is not an HTTP(S) URL.
    #[error("{url} is not an HTTP(S) URL")]
    InvalidResource { url: String },

    /// A connection attempt failed outright.
    #[error("failed to connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    /// The retry policy reported exhaustion.
    #[error("too many reconnect attempts ({attempts}), aborting")]
    TooManyRetries { attempts: u32 },
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::InvalidResource { .. } => io::ErrorKind::InvalidInput,
            StreamError::Connection { .. } => io::ErrorKind::ConnectionAborted,
            StreamError::TooManyRetries { .. } => io::ErrorKind::TimedOut,
        };
        io::Error::new(kind, err)
    }
}
