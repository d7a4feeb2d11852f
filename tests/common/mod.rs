//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use bolt_gateway::bolt::message::{chunk, signature, Response};
use bolt_gateway::bolt::{packstream, BoltMap, BoltValue};
use bolt_gateway::config::GatewayConfig;
use bolt_gateway::driver::{ClientError, GraphClient, GraphSession, RecordSet};
use bolt_gateway::http::HttpServer;
use bolt_gateway::lifecycle::Shutdown;

/// Counters and scripted replies shared by a mock client and its sessions.
#[derive(Default)]
pub struct MockState {
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub runs: AtomicUsize,
    pub closes: AtomicUsize,
    pub verifies: AtomicUsize,
    pub last_run: Mutex<Option<(String, String, BoltMap)>>,
    result: Mutex<Option<Result<RecordSet, ClientError>>>,
    connectivity: Mutex<Option<ClientError>>,
    close_error: Mutex<Option<ClientError>>,
    run_delay: Mutex<Option<Duration>>,
}

/// In-memory `GraphClient` with scripted results.
#[derive(Clone, Default)]
pub struct MockClient {
    pub state: Arc<MockState>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(records: RecordSet) -> Self {
        let client = Self::new();
        *client.state.result.lock().unwrap() = Some(Ok(records));
        client
    }

    pub fn failing(error: ClientError) -> Self {
        let client = Self::new();
        *client.state.result.lock().unwrap() = Some(Err(error));
        client
    }

    pub fn unreachable(self, error: ClientError) -> Self {
        *self.state.connectivity.lock().unwrap() = Some(error);
        self
    }

    pub fn failing_session_close(self, error: ClientError) -> Self {
        *self.state.close_error.lock().unwrap() = Some(error);
        self
    }

    /// Make every `run` take `delay` before answering.
    pub fn slow(self, delay: Duration) -> Self {
        *self.state.run_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn sessions(&self) -> (usize, usize) {
        (
            self.state.sessions_opened.load(Ordering::SeqCst),
            self.state.sessions_closed.load(Ordering::SeqCst),
        )
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphClient for MockClient {
    async fn verify_connectivity(&self) -> Result<(), ClientError> {
        self.state.verifies.fetch_add(1, Ordering::SeqCst);
        match self.state.connectivity.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn session(&self, database: &str) -> Result<Box<dyn GraphSession>, ClientError> {
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            database: database.to_string(),
        }))
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockSession {
    state: Arc<MockState>,
    database: String,
}

#[async_trait]
impl GraphSession for MockSession {
    async fn run(&mut self, query: &str, params: BoltMap) -> Result<RecordSet, ClientError> {
        self.state.runs.fetch_add(1, Ordering::SeqCst);
        *self.state.last_run.lock().unwrap() = Some((self.database.clone(), query.to_string(), params));
        let delay = *self.state.run_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(RecordSet::default()))
    }

    async fn close(self: Box<Self>) -> Result<(), ClientError> {
        self.state.sessions_closed.fetch_add(1, Ordering::SeqCst);
        match self.state.close_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// A running gateway bound to an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_gateway(config: GatewayConfig, client: Arc<dyn GraphClient>) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, client).unwrap();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });
    TestGateway {
        addr,
        shutdown,
        handle,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// How a scripted Bolt server answers RUN.
#[derive(Clone)]
pub enum BoltScript {
    Records {
        fields: Vec<&'static str>,
        rows: Vec<Vec<BoltValue>>,
    },
    Failure {
        code: &'static str,
        message: &'static str,
    },
    /// Like `Records`, but the server drops the socket after each result.
    RecordsThenHangUp {
        fields: Vec<&'static str>,
        rows: Vec<Vec<BoltValue>>,
    },
    /// RUN succeeds and PULL is never answered.
    Stall { fields: Vec<&'static str> },
}

/// Observations from a scripted Bolt server.
#[derive(Default)]
pub struct BoltServerLog {
    pub connections: AtomicUsize,
    pub hellos: Mutex<Vec<BoltMap>>,
    pub runs: Mutex<Vec<(String, BoltMap, BoltMap)>>,
    pub resets: AtomicUsize,
    pub goodbyes: AtomicUsize,
}

/// Start a minimal Bolt 5.0 server answering every RUN with `script`.
pub async fn start_bolt_server(script: BoltScript) -> (SocketAddr, Arc<BoltServerLog>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(BoltServerLog::default());
    let server_log = log.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            server_log.connections.fetch_add(1, Ordering::SeqCst);
            let log = server_log.clone();
            let script = script.clone();
            tokio::spawn(async move {
                let _ = serve_bolt(socket, script, log).await;
            });
        }
    });

    (addr, log)
}

async fn serve_bolt(mut socket: TcpStream, script: BoltScript, log: Arc<BoltServerLog>) -> std::io::Result<()> {
    let mut preamble = [0u8; 20];
    socket.read_exact(&mut preamble).await?;
    socket.write_all(&[0, 0, 0, 5]).await?;

    let mut failed = false;
    let mut hang_up = false;
    loop {
        let (tag, mut fields) = read_request(&mut socket).await?;
        let replies = match tag {
            signature::HELLO => {
                if let Some(BoltValue::Map(extra)) = fields.pop() {
                    log.hellos.lock().unwrap().push(extra);
                }
                let mut meta = BoltMap::new();
                meta.insert("server".into(), BoltValue::String("Neo4j/5.20.0".into()));
                vec![Response::Success(meta)]
            }
            signature::RUN => {
                let mut fields = fields.into_iter();
                let query = fields.next().and_then(|q| q.as_str().map(String::from)).unwrap_or_default();
                let params = fields.next().and_then(|p| p.as_map().cloned()).unwrap_or_default();
                let extra = fields.next().and_then(|e| e.as_map().cloned()).unwrap_or_default();
                log.runs.lock().unwrap().push((query, params, extra));
                match &script {
                    BoltScript::Records { fields, .. }
                    | BoltScript::RecordsThenHangUp { fields, .. }
                    | BoltScript::Stall { fields } => {
                        let mut meta = BoltMap::new();
                        meta.insert(
                            "fields".into(),
                            BoltValue::List(fields.iter().map(|f| BoltValue::String(f.to_string())).collect()),
                        );
                        vec![Response::Success(meta)]
                    }
                    BoltScript::Failure { code, message } => {
                        failed = true;
                        vec![Response::Failure {
                            code: code.to_string(),
                            message: message.to_string(),
                        }]
                    }
                }
            }
            signature::PULL if failed => vec![Response::Ignored],
            signature::PULL => match &script {
                BoltScript::Records { rows, .. } | BoltScript::RecordsThenHangUp { rows, .. } => {
                    hang_up = matches!(script, BoltScript::RecordsThenHangUp { .. });
                    let mut replies: Vec<Response> = rows.iter().cloned().map(Response::Record).collect();
                    replies.push(Response::Success(BoltMap::new()));
                    replies
                }
                BoltScript::Failure { .. } => vec![Response::Ignored],
                BoltScript::Stall { .. } => {
                    // Sit on the PULL until the client gives up and disconnects.
                    let _ = read_request(&mut socket).await;
                    return Ok(());
                }
            },
            signature::RESET => {
                failed = false;
                log.resets.fetch_add(1, Ordering::SeqCst);
                vec![Response::Success(BoltMap::new())]
            }
            signature::GOODBYE => {
                log.goodbyes.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }
            _ => return Ok(()),
        };

        let mut out = BytesMut::new();
        for reply in replies {
            let mut body = BytesMut::new();
            reply.encode(&mut body).unwrap();
            chunk(&body, &mut out);
        }
        socket.write_all(&out).await?;
        if hang_up {
            return Ok(());
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<(u8, Vec<BoltValue>)> {
    let mut message = Vec::new();
    loop {
        let size = socket.read_u16().await? as usize;
        if size == 0 {
            if message.is_empty() {
                continue;
            }
            break;
        }
        let start = message.len();
        message.resize(start + size, 0);
        socket.read_exact(&mut message[start..]).await?;
    }

    let mut raw = Bytes::from(message);
    let (count, tag) = packstream::read_struct_header(&mut raw).unwrap();
    let fields = (0..count).map(|_| packstream::decode(&mut raw).unwrap()).collect();
    Ok((tag, fields))
}
