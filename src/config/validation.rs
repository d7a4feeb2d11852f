//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the database URI scheme and host
//! - Validate value ranges (timeouts > 0, pool size > 0, bind address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::bolt::Target;
use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid database uri: {0}")]
    DatabaseUri(String),

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("database name must not be empty")]
    EmptyDatabase,

    #[error("{name} must be at most {max}")]
    TooLarge { name: &'static str, max: u64 },

    #[error("invalid allowed origin '{0}': expected an exact origin such as https://app.example")]
    Origin(String),
}

/// Upper bound on concurrently open database connections.
pub const MAX_POOL_SIZE: usize = 1024;

/// Check a configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Target::parse(&config.database.uri, config.database.connect_host.as_deref()) {
        errors.push(ValidationError::DatabaseUri(e.to_string()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.database.database.trim().is_empty() {
        errors.push(ValidationError::EmptyDatabase);
    }

    let positive = [
        ("database.connection_timeout_secs", config.database.connection_timeout_secs),
        ("database.query_timeout_secs", config.database.query_timeout_secs),
        ("database.max_pool_size", config.database.max_pool_size as u64),
        ("cors.max_body_size", config.cors.max_body_size as u64),
        ("probes.bolt_port", u64::from(config.probes.bolt_port)),
        ("probes.tcp_timeout_ms", config.probes.tcp_timeout_ms),
        ("probes.tls_timeout_ms", config.probes.tls_timeout_ms),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    if config.database.max_pool_size > MAX_POOL_SIZE {
        errors.push(ValidationError::TooLarge {
            name: "database.max_pool_size",
            max: MAX_POOL_SIZE as u64,
        });
    }

    // Wildcards are not an allow-list; every entry must be a literal origin.
    for origin in &config.cors.allowed_origins {
        if origin.contains('*') || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
