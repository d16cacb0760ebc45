//! Error types for the WLED transport

use std::fmt;
use thiserror::Error;

/// Classification of a connectivity failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkErrorKind {
    /// The request did not complete within its timeout
    Timeout,
    /// The device actively refused the connection
    Refused,
    /// The connection was reset or aborted mid-request
    Reset,
    /// The device could not be reached at all
    Unreachable,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Refused => "connection refused",
            NetworkErrorKind::Reset => "connection reset",
            NetworkErrorKind::Unreachable => "host unreachable",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while talking to a WLED device
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transport-level failure; the device may be offline
    #[error("Network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// The device answered, but not with the JSON we expected
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Shorthand for building a network error
    pub fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        TransportError::Network {
            kind,
            message: message.into(),
        }
    }

    /// True for timeouts, refused/reset connections and unreachable hosts
    pub fn is_connectivity(&self) -> bool {
        matches!(self, TransportError::Network { .. })
    }

    /// The network failure kind, if this is a connectivity failure
    pub fn network_kind(&self) -> Option<NetworkErrorKind> {
        match self {
            TransportError::Network { kind, .. } => Some(*kind),
            TransportError::Protocol(_) => None,
        }
    }

    /// Map a reqwest failure onto the transport taxonomy
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return TransportError::Protocol(format!("invalid JSON body: {}", err));
        }
        if let Some(status) = err.status() {
            return TransportError::Protocol(format!("unexpected HTTP status {}", status));
        }

        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else {
            io_error_kind(&err).unwrap_or(NetworkErrorKind::Unreachable)
        };

        TransportError::network(kind, err.to_string())
    }
}

/// Walk the error source chain looking for the underlying socket error
fn io_error_kind(err: &reqwest::Error) -> Option<NetworkErrorKind> {
    use std::error::Error as _;
    use std::io::ErrorKind;

    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return Some(match io.kind() {
                ErrorKind::TimedOut => NetworkErrorKind::Timeout,
                ErrorKind::ConnectionRefused => NetworkErrorKind::Refused,
                ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::UnexpectedEof => NetworkErrorKind::Reset,
                _ => NetworkErrorKind::Unreachable,
            });
        }
        source = inner.source();
    }
    None
}

/// Convenience Result alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
