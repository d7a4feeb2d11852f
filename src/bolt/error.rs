//! Bolt client error definitions.

use std::time::Duration;

use thiserror::Error;

use crate::bolt::packstream::PackStreamError;

/// Errors that can occur while talking to the database.
#[derive(Debug, Error)]
pub enum BoltError {
    /// Socket-level failure.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket failed before the server answered anything, so the
    /// request never ran. Typical of a pooled connection the peer closed.
    #[error("connection closed by peer: {0}")]
    Stale(std::io::Error),

    /// TLS setup or handshake failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Version negotiation failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Malformed PackStream data.
    #[error("decode error: {0}")]
    PackStream(#[from] PackStreamError),

    /// Unexpected message or message shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// FAILURE message returned by the server.
    #[error("{code}: {message}")]
    Server { code: String, message: String },

    /// Operation exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Client was closed.
    #[error("client is closed")]
    Closed,

    /// Connection URI could not be used.
    #[error("invalid uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

/// Result alias for Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;
