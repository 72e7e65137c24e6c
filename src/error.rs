//! # Error Types
//!
//! Error handling for the Hotline protocol core.
//!
//! This module defines every error variant that can occur while encoding or
//! decoding fields, framing transactions, talking to a server, or handling
//! account credentials.
//!
//! ## Error Categories
//! - **Codec Errors**: Truncated input, 16-bit size/count overflows, trailing bytes
//! - **Framing Errors**: Oversized or multi-part transactions, bad handshakes
//! - **Credential Errors**: Failures of the password hashing primitive
//! - **Session Errors**: I/O failures, timeouts, closed connections
//!
//! Codec errors are always returned to the immediate caller. Whether a
//! malformed inbound transaction drops the message or the connection is a
//! decision for the session owner.
//!
//! ## Example Usage
//! ```rust
//! use hotline_protocol::core::field_block::{deserialize_fields, DecodeMode};
//! use hotline_protocol::error::ProtocolError;
//! use tracing::warn;
//!
//! match deserialize_fields(&[0x00, 0x01, 0x00], DecodeMode::Strict) {
//!     Err(ProtocolError::TruncatedInput { needed, available }) => {
//!         warn!(needed, available, "Dropping malformed field block");
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use crate::core::field::FieldId;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Handshake errors
    pub const ERR_INVALID_HANDSHAKE: &str = "Invalid handshake reply";

    /// Connection errors
    pub const ERR_CONNECTION_CLOSED: &str = "Connection closed";
    pub const ERR_TIMEOUT: &str = "Operation timed out";

    /// Credential errors
    pub const ERR_BCRYPT_COST: &str = "bcrypt cost must be between 4 and 31";
}

/// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A declared length could not be satisfied by the remaining bytes
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    /// Field payload longer than a 16-bit size can describe
    #[error("Field payload too large: {0} bytes (maximum 65535)")]
    SizeOverflow(usize),

    /// More fields than a 16-bit count can describe
    #[error("Too many fields: {0} (maximum 65535)")]
    CountOverflow(usize),

    /// Bytes left over after the declared field count was read
    #[error("{0} trailing bytes after field block")]
    TrailingBytes(usize),

    #[error("Invalid value for field {id}: {len} bytes")]
    InvalidFieldValue { id: FieldId, len: usize },

    #[error("Missing required field {0}")]
    MissingField(FieldId),

    #[error("Transaction too large: {0} bytes")]
    OversizedTransaction(usize),

    #[error("Unsupported multi-part transaction: total size {total}, data size {data}")]
    UnsupportedFraming { total: u32, data: u32 },

    #[error("Invalid handshake reply")]
    InvalidHandshake,

    #[error("Handshake rejected by server with code {0}")]
    HandshakeRejected(u32),

    #[error("Unexpected transaction type {0}")]
    UnexpectedTransaction(u16),

    /// Reply carried a non-zero error code
    #[error("Server error {code}: {message}")]
    ServerError { code: u32, message: String },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<bcrypt::BcryptError> for ProtocolError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ProtocolError::PasswordHash(err.to_string())
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
