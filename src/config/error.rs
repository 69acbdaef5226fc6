//! Stream record error types

use std::fmt;

/// Reason a stream record was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Encoding field is not one of the supported encodings
    UnknownEncoding(String),
    /// A required field is absent or empty
    MissingField(&'static str),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::UnknownEncoding(enc) => write!(f, "Invalid encoding: {}", enc),
            RecordError::MissingField(field) => write!(f, "Missing field: {}", field),
        }
    }
}

impl std::error::Error for RecordError {}
