//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing connection (Bolt client or diagnostic probe)
//!     → TcpStream::connect(dial host, port)
//!     → tls.rs (optional rustls handshake against the URI host)
//!     → Hand off to the Bolt connection or probe report
//! ```
//!
//! # Design Decisions
//! - One rustls configuration per verification mode, built once and shared
//! - The ring crypto provider is selected explicitly, no process default
//! - Self-signed mode skips certificate checks but still negotiates TLS

pub mod tls;
