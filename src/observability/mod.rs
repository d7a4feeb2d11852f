//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, EnvFilter-controlled)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line via the TraceLayer span
//! - Metric updates are no-ops until a recorder is installed
//! - Credentials never reach a log line

pub mod logging;
pub mod metrics;
