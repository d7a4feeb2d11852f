//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (declared Origin must be allow-listed, else 403)
//!     → cors.rs (CORS headers and preflight for allowed origins)
//!     → limits.rs (body size cap, 413)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Fail closed: a declared origin not on the list never reaches a handler
//! - Rejections carry no body
//! - An empty allow-list permits only requests without an Origin

pub mod cors;
pub mod limits;
pub mod origin;

pub use cors::cors_layer;
pub use origin::{origin_guard, AllowedOrigins};
