//! Client-facing error type.

use thiserror::Error;

use crate::bolt::BoltError;

/// Errors surfaced by a `GraphClient` or `GraphSession`.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Could not reach or talk to the server.
    #[error("{0}")]
    Connection(String),

    /// Operation exceeded its deadline.
    #[error("{0}")]
    Timeout(String),

    /// Server rejected the request.
    #[error("{message}")]
    Server { code: String, message: String },

    /// Unexpected or malformed protocol traffic.
    #[error("{0}")]
    Protocol(String),

    /// The client has been closed.
    #[error("client is closed")]
    Closed,
}

impl ClientError {
    /// Server status code, when the server supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Server { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }
}

impl From<BoltError> for ClientError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::Server { code, message } => ClientError::Server { code, message },
            BoltError::Timeout(_) => ClientError::Timeout(err.to_string()),
            BoltError::Closed => ClientError::Closed,
            BoltError::PackStream(_) | BoltError::Protocol(_) => ClientError::Protocol(err.to_string()),
            BoltError::Io(_)
            | BoltError::Stale(_)
            | BoltError::Tls(_)
            | BoltError::Handshake(_)
            | BoltError::InvalidUri { .. } => ClientError::Connection(err.to_string()),
        }
    }
}
