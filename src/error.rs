//! Crate-level error types

use std::fmt;
use std::io;

use crate::config::RecordError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay operations
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O failure
    Io(io::Error),
    /// A stream record could not be turned into a stream spec
    Record(RecordError),
    /// Worker assignment environment is incomplete or malformed
    Assignment(String),
    /// The engine's notification channel closed while a worker was running
    EngineClosed,
    /// A configuration file exceeded its size cap
    Oversized { limit: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Record(e) => write!(f, "Invalid stream record: {}", e),
            Error::Assignment(msg) => write!(f, "Invalid worker assignment: {}", msg),
            Error::EngineClosed => write!(f, "Engine notification channel closed"),
            Error::Oversized { limit } => write!(f, "File larger than {} bytes", limit),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Record(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Error::Record(e)
    }
}
