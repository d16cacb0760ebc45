//! Error types for discovery and pairing.

use std::fmt;

use wled_client::TransportError;

/// Error type for discovery and pairing operations.
///
/// Covers announcements that cannot be used and devices that could not be
/// queried while building a pairing record.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The device did not answer, or answered with unusable data
    Transport(TransportError),
    /// Announcement missing the data needed to reach the device
    InvalidAnnouncement(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Transport(err) => write!(f, "Could not connect to WLED device: {}", err),
            DiscoveryError::InvalidAnnouncement(msg) => write!(f, "Invalid announcement: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::Transport(err) => Some(err),
            DiscoveryError::InvalidAnnouncement(_) => None,
        }
    }
}

impl From<TransportError> for DiscoveryError {
    fn from(err: TransportError) -> Self {
        DiscoveryError::Transport(err)
    }
}

/// Convenience Result type alias for discovery operations.
///
/// Equivalent to `std::result::Result<T, DiscoveryError>`.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
