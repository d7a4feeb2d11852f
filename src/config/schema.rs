//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Graph database connection settings.
    pub database: DatabaseConfig,

    /// Cross-origin policy and request limits.
    pub cors: CorsConfig,

    /// Diagnostic probe settings.
    pub probes: ProbeConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Graph database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URI (bolt, bolt+s, bolt+ssc, neo4j, neo4j+s, neo4j+ssc).
    pub uri: String,

    /// Username for basic authentication.
    pub user: String,

    /// Password for basic authentication. Absence is logged, not fatal.
    pub password: Option<String>,

    /// Logical database every session is bound to.
    pub database: String,

    /// Host to dial instead of the URI host. TLS still validates the URI host.
    pub connect_host: Option<String>,

    /// Connection establishment timeout in seconds.
    pub connection_timeout_secs: u64,

    /// Per-query execution timeout in seconds.
    pub query_timeout_secs: u64,

    /// Maximum number of concurrently open connections.
    pub max_pool_size: usize,

    /// User agent announced in the Bolt HELLO message.
    pub user_agent: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: None,
            database: "neo4j".to_string(),
            connect_host: None,
            connection_timeout_secs: 10,
            query_timeout_secs: 30,
            max_pool_size: 16,
            user_agent: format!("bolt-gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Cross-origin and request size policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the gateway from a browser.
    pub allowed_origins: Vec<String>,

    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Diagnostic probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Port probed by the raw TCP and TLS checks.
    pub bolt_port: u16,

    /// Raw TCP connect timeout in milliseconds.
    pub tcp_timeout_ms: u64,

    /// TLS handshake timeout in milliseconds.
    pub tls_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            bolt_port: 7687,
            tcp_timeout_ms: 4000,
            tls_timeout_ms: 6000,
        }
    }
}

/// Timeout configuration for HTTP requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Overlay environment variables on top of the loaded configuration.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.database.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(database) = lookup("NEO4J_DATABASE") {
            self.database.database = database;
        }
        if let Some(host) = lookup("NEO4J_CONNECT_HOST") {
            let host = host.trim();
            self.database.connect_host = (!host.is_empty()).then(|| host.to_string());
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = parse_origin_list(&origins);
        }
        if let Some(port) = lookup("PORT") {
            self.listener.bind_address = with_port(&self.listener.bind_address, port.trim());
        }
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn with_port(bind_address: &str, port: &str) -> String {
    match bind_address.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", bind_address, port),
    }
}
