//! Raw transport probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;

use crate::probes::{ProbeFailure, ProbeOutcome};

/// Open a bare TCP connection and drop it immediately.
pub async fn probe_tcp(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    match time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            tracing::debug!(host, port, "TCP probe connected");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::warn!(host, port, error = %e, "TCP probe failed: connection error");
            Err(ProbeFailure::from(e))
        }
        Err(_) => {
            tracing::warn!(host, port, ?timeout, "TCP probe failed: timeout");
            Err(ProbeFailure::timeout())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::FailureKind;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(probe_tcp("127.0.0.1", port, Duration::from_secs(2)).await, Ok(()));
    }

    #[tokio::test]
    async fn test_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let failure = probe_tcp("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Connection);
        assert!(!failure.message.is_empty());
    }
}
