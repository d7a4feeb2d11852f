//! A single Bolt connection.
//!
//! # Lifecycle
//! ```text
//! open: TCP connect → [TLS] → handshake → HELLO → Ready
//! run:  RUN + PULL (pipelined) → RECORD* → SUCCESS → Ready
//!                              ↘ FAILURE → Failed (RESET → Ready)
//! I/O error or timeout mid-exchange → Defunct (dropped, never pooled)
//! close: GOODBYE → socket shutdown
//! ```

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::message::{chunk, Request, Response};
use crate::bolt::target::{Security, Target};
use crate::bolt::value::{BoltMap, BoltValue};
use crate::driver::{Record, RecordSet};
use crate::net::tls;

const MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Proposed versions, most preferred first: 5.0, 4.4.
const PROPOSALS: [[u8; 4]; 4] = [[0, 0, 0, 5], [0, 0, 4, 4], [0; 4], [0; 4]];

/// Anything a Bolt connection can run over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Basic-auth credentials.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Ready,
    Failed,
    Defunct,
}

pub struct Connection {
    stream: BufStream<Box<dyn Transport>>,
    version: (u8, u8),
    state: ConnectionState,
    server: Option<String>,
}

impl Connection {
    /// Dial the target, negotiate a version and authenticate.
    pub async fn open(target: &Target, credentials: &Credentials, user_agent: &str) -> BoltResult<Self> {
        let tcp = TcpStream::connect((target.dial_host(), target.port)).await?;
        tcp.set_nodelay(true)?;

        let transport: Box<dyn Transport> = match target.security {
            Security::Plain => Box::new(tcp),
            security => {
                let connector = tls::connector(security == Security::Verified)
                    .map_err(|e| BoltError::Tls(e.to_string()))?;
                let server_name = tls::server_name(&target.host).map_err(BoltError::Tls)?;
                let stream = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| BoltError::Tls(e.to_string()))?;
                Box::new(stream)
            }
        };

        Self::handshake(transport, credentials, user_agent).await
    }

    /// Negotiate and authenticate over an already-connected transport.
    pub async fn handshake(
        transport: Box<dyn Transport>,
        credentials: &Credentials,
        user_agent: &str,
    ) -> BoltResult<Self> {
        let mut stream = BufStream::new(transport);

        let mut preamble = Vec::with_capacity(20);
        preamble.extend_from_slice(&MAGIC);
        for proposal in PROPOSALS {
            preamble.extend_from_slice(&proposal);
        }
        stream.write_all(&preamble).await?;
        stream.flush().await?;

        let mut agreed = [0u8; 4];
        stream.read_exact(&mut agreed).await?;
        if &agreed == b"HTTP" {
            return Err(BoltError::Handshake(
                "server answered with HTTP; is this the Bolt port?".into(),
            ));
        }
        if agreed == [0; 4] {
            return Err(BoltError::Handshake("no common protocol version".into()));
        }

        let mut conn = Self {
            stream,
            version: (agreed[3], agreed[2]),
            state: ConnectionState::Ready,
            server: None,
        };
        tracing::debug!(major = conn.version.0, minor = conn.version.1, "Bolt version agreed");

        conn.send(&[Request::Hello {
            user_agent,
            principal: &credentials.user,
            credentials: &credentials.password,
        }])
        .await?;

        match conn.recv().await? {
            Response::Success(meta) => {
                conn.server = meta.get("server").and_then(BoltValue::as_str).map(String::from);
                Ok(conn)
            }
            Response::Failure { code, message } => Err(BoltError::Server { code, message }),
            other => Err(BoltError::Protocol(format!("unexpected HELLO reply: {:?}", other))),
        }
    }

    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Server agent string reported at HELLO, e.g. `Neo4j/5.20.0`.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Mark the connection unusable; it will be dropped instead of pooled.
    pub fn mark_defunct(&mut self) {
        self.state = ConnectionState::Defunct;
    }

    /// Run a query and pull every record.
    pub async fn run(&mut self, query: &str, params: &BoltMap, database: Option<&str>) -> BoltResult<RecordSet> {
        if self.state != ConnectionState::Ready {
            return Err(BoltError::Protocol(format!(
                "connection not ready ({:?})",
                self.state
            )));
        }
        let result = self.run_and_pull(query, params, database).await;
        self.observe(&result);
        result
    }

    /// Return a failed connection to a clean state.
    pub async fn reset(&mut self) -> BoltResult<()> {
        let result = self.reset_exchange().await;
        self.observe(&result);
        result
    }

    /// Say GOODBYE and shut the socket down. Errors are irrelevant here.
    pub async fn close(mut self) {
        if self.state != ConnectionState::Defunct {
            let _ = self.send(&[Request::Goodbye]).await;
        }
        let _ = self.stream.shutdown().await;
    }

    /// Any transport or protocol error leaves the stream at an unknown
    /// position, so only server FAILUREs keep the connection usable.
    fn observe<T>(&mut self, result: &BoltResult<T>) {
        if let Err(e) = result {
            if !matches!(e, BoltError::Server { .. }) {
                self.state = ConnectionState::Defunct;
            }
        }
    }

    async fn run_and_pull(&mut self, query: &str, params: &BoltMap, database: Option<&str>) -> BoltResult<RecordSet> {
        let first = self
            .exchange(&[
                Request::Run {
                    query,
                    params,
                    database,
                },
                Request::Pull { n: -1 },
            ])
            .await?;

        let keys: Arc<[String]> = match first {
            Response::Success(meta) => field_names(&meta)?.into(),
            Response::Failure { code, message } => {
                self.state = ConnectionState::Failed;
                // PULL was pipelined and is answered with IGNORED.
                self.recv().await?;
                return Err(BoltError::Server { code, message });
            }
            other => return Err(unexpected("RUN", &other)),
        };

        let mut records = Vec::new();
        loop {
            match self.recv().await? {
                Response::Record(values) => records.push(Record::new(keys.clone(), values)),
                Response::Success(_) => break,
                Response::Failure { code, message } => {
                    self.state = ConnectionState::Failed;
                    return Err(BoltError::Server { code, message });
                }
                other => return Err(unexpected("PULL", &other)),
            }
        }

        Ok(RecordSet::new(keys.to_vec(), records))
    }

    async fn reset_exchange(&mut self) -> BoltResult<()> {
        let mut reply = self.exchange(&[Request::Reset]).await?;
        loop {
            match reply {
                Response::Success(_) => {
                    self.state = ConnectionState::Ready;
                    return Ok(());
                }
                Response::Ignored => reply = self.recv().await?,
                other => return Err(unexpected("RESET", &other)),
            }
        }
    }

    /// Send `requests` and read the first reply. A socket error before
    /// that reply is reported as `Stale`.
    async fn exchange(&mut self, requests: &[Request<'_>]) -> BoltResult<Response> {
        let first = match self.send(requests).await {
            Ok(()) => self.recv().await,
            Err(e) => Err(e),
        };
        first.map_err(|e| match e {
            BoltError::Io(io) => BoltError::Stale(io),
            other => other,
        })
    }

    async fn send(&mut self, requests: &[Request<'_>]) -> BoltResult<()> {
        let mut out = BytesMut::new();
        for request in requests {
            let mut body = BytesMut::new();
            request.encode(&mut body)?;
            chunk(&body, &mut out);
            tracing::trace!(message = request.name(), bytes = body.len(), "Bolt send");
        }
        self.stream.write_all(&out).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> BoltResult<Response> {
        let mut message = BytesMut::new();
        loop {
            let size = self.stream.read_u16().await? as usize;
            if size == 0 {
                if message.is_empty() {
                    // NOOP keep-alive between messages.
                    continue;
                }
                break;
            }
            let start = message.len();
            message.resize(start + size, 0);
            self.stream.read_exact(&mut message[start..]).await?;
        }
        Response::decode(Bytes::from(message))
    }
}

fn field_names(meta: &BoltMap) -> BoltResult<Vec<String>> {
    match meta.get("fields") {
        None => Ok(Vec::new()),
        Some(BoltValue::List(fields)) => fields
            .iter()
            .map(|f| {
                f.as_str()
                    .map(String::from)
                    .ok_or_else(|| BoltError::Protocol("non-string field name".into()))
            })
            .collect(),
        Some(other) => Err(BoltError::Protocol(format!("invalid fields: {:?}", other))),
    }
}

fn unexpected(stage: &str, response: &Response) -> BoltError {
    BoltError::Protocol(format!("unexpected {} reply: {:?}", stage, response))
}
