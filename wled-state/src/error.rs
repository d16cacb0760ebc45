//! Error types for wled-state

use thiserror::Error;
use wled_client::TransportError;

use crate::options::OptionKind;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the synchronization engine
///
/// Poll-loop failures never leave the engine; these are returned by command
/// methods and configuration validation only.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid configuration, e.g. no address
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Command argument rejected before anything was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The device could not be reached or answered badly
    #[error("Device communication failed: {0}")]
    Transport(#[from] TransportError),

    /// The engine was disposed and no longer talks to the device
    #[error("Device engine has been disposed")]
    Disposed,
}

impl SyncError {
    /// True when the error was caused by a bad command argument
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}

/// Rejected command arguments
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid {kind} ID: {value}")]
    NotNumeric { kind: OptionKind, value: String },

    #[error("Invalid {kind} ID: {id}. Must be between {min} and {max}")]
    OutOfRange {
        kind: OptionKind,
        id: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid preset ID: {0}. Must be -1 (no preset) or > 0")]
    InvalidPreset(i64),

    #[error("Invalid {capability} level: {value}")]
    InvalidLevel { capability: &'static str, value: f64 },

    #[error("Unexpected value for {capability}: expected {expected}")]
    WrongValueType {
        capability: &'static str,
        expected: &'static str,
    },
}
