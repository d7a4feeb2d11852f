//! Encrypted transport probe.

use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time;

use crate::net::tls;
use crate::probes::{ProbeFailure, ProbeOutcome};

/// Negotiated cipher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CipherInfo {
    pub name: String,
    pub version: String,
}

/// What the handshake negotiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsInfo {
    /// The server certificate validated against `server_name`.
    pub authorized: bool,
    pub alpn_protocol: Option<String>,
    pub cipher: Option<CipherInfo>,
}

/// Connect to `host:port` and complete a verified TLS handshake for
/// `server_name`. The whole exchange shares one deadline.
pub async fn probe_tls(host: &str, port: u16, server_name: &str, timeout: Duration) -> ProbeOutcome<TlsInfo> {
    match time::timeout(timeout, handshake(host, port, server_name)).await {
        Ok(Ok(info)) => {
            tracing::debug!(host, port, cipher = ?info.cipher, "TLS probe handshake complete");
            Ok(info)
        }
        Ok(Err(failure)) => {
            tracing::warn!(host, port, error = %failure.message, "TLS probe failed");
            Err(failure)
        }
        Err(_) => {
            tracing::warn!(host, port, ?timeout, "TLS probe failed: timeout");
            Err(ProbeFailure::timeout())
        }
    }
}

async fn handshake(host: &str, port: u16, server_name: &str) -> ProbeOutcome<TlsInfo> {
    let connector = tls::connector(true).map_err(|e| ProbeFailure::other(e.to_string()))?;
    let name = tls::server_name(server_name).map_err(ProbeFailure::other)?;

    let tcp = TcpStream::connect((host, port)).await?;
    let stream = connector
        .connect(name, tcp)
        .await
        .map_err(|e| ProbeFailure::connection(e.to_string()))?;

    let (_, session) = stream.get_ref();
    let info = TlsInfo {
        authorized: true,
        alpn_protocol: session
            .alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned()),
        cipher: session.negotiated_cipher_suite().map(|suite| CipherInfo {
            name: format!("{:?}", suite.suite()),
            version: session
                .protocol_version()
                .map(|v| format!("{:?}", v))
                .unwrap_or_default(),
        }),
    };
    Ok(info)
}
