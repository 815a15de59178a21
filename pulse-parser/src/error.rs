//! Error types for `pactl` text parsing

use thiserror::Error;

/// Reasons a single record block was rejected.
///
/// A rejected block never aborts the surrounding listing: the parser records
/// the error and moves on to the next block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required line was not present in the block
    #[error("{record} #{id}: missing required field `{field}`")]
    MissingField {
        record: &'static str,
        id: String,
        field: &'static str,
    },

    /// A numeric field was present but not a well-formed `u32`
    #[error("{record} #{id}: field `{field}` is not a valid number: {value:?}")]
    InvalidNumber {
        record: &'static str,
        id: String,
        field: &'static str,
        value: String,
    },

    /// All fields were present but not in the order a stream block lists them
    #[error("{record} #{id}: fields out of order")]
    OutOfOrder { record: &'static str, id: String },
}

impl ParseError {
    /// Record kind the error belongs to (`Sink`, `Source`, ...)
    pub fn record(&self) -> &'static str {
        match self {
            ParseError::MissingField { record, .. }
            | ParseError::InvalidNumber { record, .. }
            | ParseError::OutOfOrder { record, .. } => record,
        }
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
