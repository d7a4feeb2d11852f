//! Database client contract.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → GraphClient::session(database)   (scoped, one per request)
//!     → GraphSession::run(query, params) → RecordSet
//!     → GraphSession::close()            (always, success or failure)
//!
//! Shutdown path
//!     → GraphClient::close()             (exactly once)
//! ```
//!
//! # Design Decisions
//! - Handlers only see these traits; the Bolt client is one implementation
//! - The client is an owned long-lived handle passed through `AppState`
//! - Pooling and mutual exclusion are the implementation's concern

pub mod error;
pub mod record;

use async_trait::async_trait;

pub use error::ClientError;
pub use record::{Record, RecordSet};

use crate::bolt::BoltMap;

/// Process-wide database client.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Exercise the full configured connection (auth, TLS, routing).
    async fn verify_connectivity(&self) -> Result<(), ClientError>;

    /// Open a session bound to a logical database.
    async fn session(&self, database: &str) -> Result<Box<dyn GraphSession>, ClientError>;

    /// Release every pooled resource. Further sessions fail.
    async fn close(&self);
}

/// Per-request handle used for one query execution.
#[async_trait]
pub trait GraphSession: Send {
    async fn run(&mut self, query: &str, params: BoltMap) -> Result<RecordSet, ClientError>;

    async fn close(self: Box<Self>) -> Result<(), ClientError>;
}
