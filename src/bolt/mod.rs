//! Bolt protocol client.
//!
//! # Data Flow
//! ```text
//! BoltClient::session(db)
//!     → pool (idle connection or connection.rs::open)
//!     → connection.rs (handshake, HELLO, RUN + PULL)
//!     → message.rs (chunked framing, request/response structs)
//!     → packstream.rs (binary value encoding)
//!     → value.rs (BoltValue tagged union)
//!     → RecordSet handed back to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Speaks Bolt 5.0 with a 4.4 fallback; both accept credentials in HELLO
//! - `neo4j://` URIs connect directly; routing tables are not consulted
//! - Connections that saw a FAILURE are RESET before going back to the pool
//! - Every network wait is bounded by a configured timeout

pub mod client;
pub mod connection;
pub mod error;
pub mod message;
pub mod packstream;
pub mod target;
pub mod value;

pub use client::BoltClient;
pub use error::BoltError;
pub use target::{Security, Target};
pub use value::{BoltMap, BoltValue, Node, Path, Relationship, Segment};
