//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Apply env → Validate → Build client → Bind listener
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain in-flight requests → Close client once → Exit
//! ```
//!
//! # Design Decisions
//! - A missing database password is a warning, not a startup failure
//! - The database client is created once and closed once
//! - No client I/O happens at startup; the first request dials

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
