//! Error types for Stockbook core operations.
//!
//! Every engine failure is propagated verbatim to the caller; nothing at this
//! layer retries. The CLI maps these to user-facing messages.

use thiserror::Error;

use crate::record::Field;

/// Result type alias for Stockbook operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Header or search property is not one of the known fields
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Source name is not one of the configured collections
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Value cannot be converted to its field's type
    #[error("Malformed value for {field}: {value:?}")]
    MalformedValue { field: Field, value: String },

    /// Row carries more values than the header has columns
    #[error("Row has {values} values but only {headers} headers")]
    RowTooLong { values: usize, headers: usize },

    /// Headers requested on a collection with zero records
    #[error("Source has no records: {0}")]
    EmptySource(String),

    /// I/O failure while appending, rewriting or renaming
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Next identifier would not fit in five digits
    #[error("ID exceeds the maximum allowed value")]
    IdExhausted,

    /// No record carries the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document backend handshake failed
    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}
