//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned and propagated)
//!     → security (origin guard, CORS, body limit)
//!     → query.rs  → GraphClient session → serializer → response.rs envelope
//!     → health.rs / debug.rs → probes → JSON outcome
//!     → Send to client
//! ```

pub mod debug;
pub mod health;
pub mod query;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{QueryEnvelope, QueryErrorBody, Row, StatementResult};
pub use server::{AppState, HttpServer};
