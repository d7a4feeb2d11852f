//! Connection target parsed from a database URI.

use url::Url;

use crate::bolt::error::{BoltError, BoltResult};

/// Default Bolt port.
pub const DEFAULT_PORT: u16 = 7687;

/// Transport security selected by the URI scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// `bolt://`, `neo4j://`
    Plain,
    /// `bolt+s://`, `neo4j+s://`
    Verified,
    /// `bolt+ssc://`, `neo4j+ssc://`
    SelfSigned,
}

impl Security {
    pub fn is_tls(&self) -> bool {
        !matches!(self, Security::Plain)
    }
}

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host named in the URI; used for TLS server name validation.
    pub host: String,
    pub port: u16,
    pub security: Security,
    /// Host actually dialed when it differs from `host`.
    pub connect_host: Option<String>,
    /// True for `neo4j://` family URIs.
    pub routing: bool,
}

impl Target {
    /// Parse a database URI, optionally overriding the dialed host.
    pub fn parse(uri: &str, connect_host: Option<&str>) -> BoltResult<Self> {
        let invalid = |reason: &str| BoltError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;

        let (routing, security) = match url.scheme() {
            "bolt" => (false, Security::Plain),
            "bolt+s" => (false, Security::Verified),
            "bolt+ssc" => (false, Security::SelfSigned),
            "neo4j" => (true, Security::Plain),
            "neo4j+s" => (true, Security::Verified),
            "neo4j+ssc" => (true, Security::SelfSigned),
            other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            security,
            connect_host: connect_host
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from),
            routing,
        })
    }

    /// Host to open the socket against.
    pub fn dial_host(&self) -> &str {
        self.connect_host.as_deref().unwrap_or(&self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schemes() {
        let t = Target::parse("bolt://localhost", None).unwrap();
        assert_eq!(t.security, Security::Plain);
        assert_eq!(t.port, DEFAULT_PORT);
        assert!(!t.routing);

        let t = Target::parse("neo4j+s://abc.databases.neo4j.io", None).unwrap();
        assert_eq!(t.security, Security::Verified);
        assert!(t.routing);

        let t = Target::parse("bolt+ssc://db:7688", None).unwrap();
        assert_eq!(t.security, Security::SelfSigned);
        assert_eq!(t.port, 7688);
    }

    #[test]
    fn test_connect_host_override() {
        let t = Target::parse("neo4j+s://db.example.com", Some("10.1.2.3")).unwrap();
        assert_eq!(t.host, "db.example.com");
        assert_eq!(t.dial_host(), "10.1.2.3");

        let t = Target::parse("bolt://db.example.com", Some("")).unwrap();
        assert_eq!(t.dial_host(), "db.example.com");
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let err = Target::parse("http://localhost:7474", None).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
        assert!(Target::parse("not a uri", None).is_err());
    }
}
