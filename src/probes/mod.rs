//! Diagnostic probes.
//!
//! # Data Flow
//! ```text
//! GET /debug/bolt   → tcp.rs    (bare TCP connect, bounded)
//! GET /debug/tls    → tls.rs    (TCP + TLS handshake against the URI host)
//! GET /debug/driver → driver.rs (GraphClient::verify_connectivity)
//!     → ProbeOutcome (Success | Failure{kind, message})
//!     → http/debug.rs maps kind to 502/504
//! ```
//!
//! # Design Decisions
//! - Probes are stateless and independent of each other
//! - The first of connect/timeout/error decides the outcome; the pending
//!   socket is dropped as soon as `tokio::time::timeout` resolves
//! - Every probe is bounded, including the driver probe

pub mod driver;
pub mod tcp;
pub mod tls;

use serde::Serialize;

pub use driver::probe_driver;
pub use tcp::probe_tcp;
pub use tls::{probe_tls, TlsInfo};

/// Failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Connection,
    Other,
}

/// Why a probe failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProbeFailure {
    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: "timeout".to_string(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Connection,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }
}

impl From<std::io::Error> for ProbeFailure {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(),
            _ => Self::connection(err.to_string()),
        }
    }
}

/// Result of one probe invocation. `T` carries success metadata.
pub type ProbeOutcome<T = ()> = Result<T, ProbeFailure>;

/// Stable label for metrics.
pub fn outcome_label<T>(outcome: &ProbeOutcome<T>) -> &'static str {
    match outcome {
        Ok(_) => "success",
        Err(f) => match f.kind {
            FailureKind::Timeout => "timeout",
            FailureKind::Connection => "connection_error",
            FailureKind::Other => "error",
        },
    }
}
