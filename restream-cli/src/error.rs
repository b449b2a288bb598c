//! Error types for the restream CLI.

use std::fmt;
use std::io;

use restream::StreamError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line input.
    Usage(String),
    /// The download stream failed.
    Stream(StreamError),
    /// Reading the stream or writing the output failed.
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{}", msg),
            Self::Stream(err) => write!(f, "download failed: {}", err),
            Self::Io(err) => write!(f, "download failed: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage(_) => None,
            Self::Stream(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<StreamError> for CliError {
    fn from(err: StreamError) -> Self {
        Self::Stream(err)
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
