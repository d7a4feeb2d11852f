//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve configuration: file, then environment, then validation
//! - Warn about missing credentials without failing
//! - Build the process-wide database client

use std::path::Path;
use std::sync::Arc;

use crate::bolt::{BoltClient, BoltError};
use crate::config::{self, ConfigError, DatabaseConfig, GatewayConfig};
use crate::driver::GraphClient;

/// Load `path` (or defaults), overlay the process environment, validate.
pub fn resolve_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    resolve_config_with(path, |key| std::env::var(key).ok())
}

/// As [`resolve_config`] with an injectable environment lookup.
pub fn resolve_config_with<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => config::read_config(path)?,
        None => GatewayConfig::default(),
    };
    config.apply_env(env);
    config::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Log a warning when no password is configured. Returns whether one is set.
pub fn check_credentials(database: &DatabaseConfig) -> bool {
    let present = database.password.as_deref().is_some_and(|p| !p.is_empty());
    if !present {
        tracing::warn!(
            user = %database.user,
            "No database password configured; queries will fail at first use"
        );
    }
    present
}

/// Create the shared client. No connection is opened here.
pub fn build_client(database: &DatabaseConfig) -> Result<Arc<dyn GraphClient>, BoltError> {
    let client = BoltClient::new(database)?;
    tracing::info!(
        host = %client.target().host,
        port = client.target().port,
        tls = client.target().security.is_tls(),
        database = %database.database,
        "Database client configured"
    );
    Ok(Arc::new(client))
}
