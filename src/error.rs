//! Error types for the Metexon BLE client library.

use thiserror::Error;

use crate::codec::StructKind;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Result type alias for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors raised while encoding or decoding a characteristic payload.
///
/// None of these are retried automatically. `LengthMismatch` means the read
/// payload is corrupt; every other variant is a caller mistake.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Payload length does not match the structure's fixed size
    #[error("Payload length mismatch for {kind}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        kind: StructKind,
        expected: usize,
        actual: usize,
    },

    /// Value cannot be represented by the field's scalar type
    #[error("Value {value} out of range for field '{field}' ({scalar})")]
    OutOfRange {
        field: String,
        value: String,
        scalar: String,
    },

    /// Record names a field the structure does not have
    #[error("Unknown field '{field}' for {kind}")]
    UnknownField { kind: StructKind, field: String },

    /// Explicit absent marker on a field that has no sentinel
    #[error("Field '{field}' of {kind} has no sentinel; it cannot be left unchanged")]
    UnsupportedPartialUpdate { kind: StructKind, field: String },

    /// Field has no sentinel and neither the record nor a baseline supplies it
    #[error("Field '{field}' of {kind} must be provided or filled from a baseline")]
    MissingBaseline { kind: StructKind, field: String },

    /// Value of the wrong shape (e.g. a JSON string where a number is expected)
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Malformed structure definition
    #[error("Schema error: {0}")]
    Schema(String),
}

/// Errors raised by [`ZellenradschleuseClient`](crate::client::ZellenradschleuseClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// Payload could not be encoded or decoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The firmware does not accept writes to this structure
    #[error("Structure {0} is read-only")]
    ReadOnly(StructKind),

    /// Underlying transport failed; the source error is passed through untouched
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Wrap a transport error.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ClientError::Transport(Box::new(err))
    }
}

/// Errors raised while loading a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
