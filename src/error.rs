//! Greeter Error Types
//!
//! One error enum covers the wire codec, the transport and the
//! authentication state machine. Daemon-reported failures are not errors
//! here: they travel through the protocol as `Response::Error` and end the
//! attempt with `Ok(false)`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for greeter operations
pub type Result<T> = std::result::Result<T, GreeterError>;

/// Greeter error types
#[derive(Error, Debug)]
pub enum GreeterError {
    /// Missing or invalid daemon endpoint / configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Could not connect to the daemon socket
    #[error("Failed to connect to greetd socket {path}: {source}")]
    Connect {
        /// Socket path that was attempted
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Stream ended before a full frame was read
    #[error("Connection closed by greetd")]
    ConnectionClosed,

    /// IO error on an established connection
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Declared frame length exceeds the decode ceiling
    #[error("Message payload of {length} bytes exceeds maximum permissible length of {max}")]
    FrameTooLarge {
        /// Declared payload length
        length: u32,
        /// Decode ceiling
        max: u32,
    },

    /// Encoded payload does not fit the 32-bit length prefix
    #[error("Encoded payload of {0} bytes does not fit a frame")]
    PayloadTooLong(usize),

    /// Payload is not a valid message
    #[error("Failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// Message could not be serialized
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Attempt aborted through the cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation issued after the transport was closed
    #[error("Transport already closed")]
    TransportClosed,

    /// A presentation hook failed
    #[error("Greeter hook failed: {0}")]
    Hook(String),
}

impl GreeterError {
    /// True for errors caused by the caller aborting the attempt
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GreeterError::Cancelled)
    }

    /// Whether the outer driver may retry the attempt after backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            classify_error(self),
            ErrorClass::Connection | ErrorClass::ProtocolViolation | ErrorClass::Hook
        )
    }
}

/// Error classification for recovery decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Missing or invalid endpoint; fatal before any I/O
    Configuration,
    /// Socket could not be established or was lost
    Connection,
    /// Oversized or malformed frame, unknown tag or enum literal
    ProtocolViolation,
    /// Caller-requested abort
    Cancellation,
    /// API misuse such as sending on a closed transport
    Usage,
    /// Presentation layer failure
    Hook,
}

/// Classify error for the driver's retry policy
pub fn classify_error(error: &GreeterError) -> ErrorClass {
    match error {
        GreeterError::Configuration(_) => ErrorClass::Configuration,

        GreeterError::Connect { .. } | GreeterError::ConnectionClosed | GreeterError::Io(_) => {
            ErrorClass::Connection
        }

        GreeterError::FrameTooLarge { .. }
        | GreeterError::PayloadTooLong(_)
        | GreeterError::Decode(_)
        | GreeterError::Encode(_) => ErrorClass::ProtocolViolation,

        GreeterError::Cancelled => ErrorClass::Cancellation,

        GreeterError::TransportClosed => ErrorClass::Usage,

        GreeterError::Hook(_) => ErrorClass::Hook,
    }
}
