//! Error types for relaykit
//!
//! Provides a unified error type for codec, transport and session operations.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type for relaykit operations
#[derive(Debug, Error)]
pub enum RelayError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No response within {0:?}")]
    Timeout(Duration),

    // -------------------------------------------------------------------------
    // Frame Errors
    // -------------------------------------------------------------------------
    /// Checksum byte does not match the sum of the preceding bytes.
    /// Recoverable: the whole exchange is retried.
    #[error("Invalid checksum in frame [{bytes}]")]
    InvalidChecksum { bytes: String },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Gave up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<RelayError>,
    },

    #[error("Relay {relay} out of range (module has relays 1..={max})")]
    InvalidRelay { relay: usize, max: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// True for failures that a fresh connect-send-receive attempt may cure
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::Timeout(_) | RelayError::InvalidChecksum { .. }
        )
    }

    /// Classify a socket error, turning read/connect timeouts into `Timeout`
    pub(crate) fn from_socket(err: io::Error, timeout: Duration) -> Self {
        match err.kind() {
            // Unix reports an expired SO_RCVTIMEO as WouldBlock, Windows as TimedOut
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => RelayError::Timeout(timeout),
            _ => RelayError::Io(err),
        }
    }
}
