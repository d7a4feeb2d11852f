//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → GatewayConfig::apply_env (NEO4J_*, ALLOWED_ORIGINS, PORT)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the gateway runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing database password is a startup warning, not an error

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    CorsConfig, DatabaseConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, ProbeConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError, MAX_POOL_SIZE};
