//! HTTP gateway in front of a Bolt graph database.

pub mod bolt;
pub mod config;
pub mod driver;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod probes;
pub mod security;
pub mod serializer;

pub use config::GatewayConfig;
pub use driver::{GraphClient, GraphSession};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
