//! Client-level connectivity probe.

use std::time::Duration;

use tokio::time;

use crate::driver::GraphClient;
use crate::probes::{ProbeFailure, ProbeOutcome};

/// Ask the client to verify connectivity end to end.
pub async fn probe_driver(client: &dyn GraphClient, timeout: Duration) -> ProbeOutcome {
    match time::timeout(timeout, client.verify_connectivity()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) if e.is_timeout() => Err(ProbeFailure::timeout()),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Driver connectivity check failed");
            Err(ProbeFailure::connection(e.to_string()))
        }
        Err(_) => {
            tracing::warn!(?timeout, "Driver connectivity check timed out");
            Err(ProbeFailure::timeout())
        }
    }
}
