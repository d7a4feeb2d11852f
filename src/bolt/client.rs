//! Pooled Bolt client.
//!
//! # Responsibilities
//! - Bound the number of open connections (semaphore permits)
//! - Reuse idle connections, resetting any that saw a FAILURE
//! - Replace a reused connection once if the peer closed it while idle
//! - Apply connect and query timeouts
//! - Close exactly once: drain the pool and refuse new sessions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;

use crate::bolt::connection::{Connection, ConnectionState, Credentials};
use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::target::Target;
use crate::bolt::value::BoltMap;
use crate::config::DatabaseConfig;
use crate::driver::{ClientError, GraphClient, GraphSession, RecordSet};

struct Pool {
    target: Target,
    credentials: Credentials,
    user_agent: String,
    connect_timeout: Duration,
    query_timeout: Duration,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<Connection>>,
    closed: AtomicBool,
}

/// Bolt implementation of [`GraphClient`].
#[derive(Clone)]
pub struct BoltClient {
    pool: Arc<Pool>,
}

impl BoltClient {
    /// Create a client. No connection is opened until first use.
    pub fn new(config: &DatabaseConfig) -> BoltResult<Self> {
        let target = Target::parse(&config.uri, config.connect_host.as_deref())?;
        if target.routing {
            tracing::info!(
                host = %target.host,
                "neo4j:// scheme connects directly; routing tables are not used"
            );
        }

        let pool = Pool {
            target,
            credentials: Credentials {
                user: config.user.clone(),
                password: config.password.clone().unwrap_or_default(),
            },
            user_agent: config.user_agent.clone(),
            connect_timeout: Duration::from_secs(config.connection_timeout_secs),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            permits: Arc::new(Semaphore::new(config.max_pool_size.min(Semaphore::MAX_PERMITS))),
            idle: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        };
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn target(&self) -> &Target {
        &self.pool.target
    }

    pub fn is_closed(&self) -> bool {
        self.pool.closed.load(Ordering::SeqCst)
    }

    /// Number of idle pooled connections.
    pub fn idle_connections(&self) -> usize {
        self.pool.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }
}

impl Pool {
    /// Take a permit and a ready connection. The flag is true when the
    /// connection came from the idle pool.
    async fn acquire(&self) -> BoltResult<(OwnedSemaphorePermit, Connection, bool)> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BoltError::Closed);
        }

        let permit = timeout(self.connect_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| BoltError::Timeout(self.connect_timeout))?
            .map_err(|_| BoltError::Closed)?;

        while let Some(mut conn) = self.take_idle() {
            match conn.state() {
                ConnectionState::Ready => return Ok((permit, conn, true)),
                ConnectionState::Failed => {
                    if timeout(self.connect_timeout, conn.reset()).await.is_ok_and(|r| r.is_ok()) {
                        return Ok((permit, conn, true));
                    }
                }
                ConnectionState::Defunct => {}
            }
        }

        Ok((permit, self.open().await?, false))
    }

    /// Dial a new connection within the connect timeout.
    async fn open(&self) -> BoltResult<Connection> {
        let conn = timeout(
            self.connect_timeout,
            Connection::open(&self.target, &self.credentials, &self.user_agent),
        )
        .await
        .map_err(|_| BoltError::Timeout(self.connect_timeout))??;

        tracing::debug!(
            host = %self.target.dial_host(),
            port = self.target.port,
            server = conn.server().unwrap_or("unknown"),
            "Opened Bolt connection"
        );
        Ok(conn)
    }

    fn take_idle(&self) -> Option<Connection> {
        self.idle.lock().ok()?.pop()
    }

    /// Return a connection to the pool, or close it if it cannot be reused.
    async fn release(&self, mut conn: Connection) {
        if conn.state() == ConnectionState::Failed
            && !timeout(self.connect_timeout, conn.reset()).await.is_ok_and(|r| r.is_ok())
        {
            conn.mark_defunct();
        }

        if conn.state() != ConnectionState::Ready || self.closed.load(Ordering::SeqCst) {
            conn.close().await;
            return;
        }

        match self.idle.lock() {
            Ok(mut idle) => idle.push(conn),
            Err(_) => tracing::warn!("Connection pool lock poisoned; dropping connection"),
        }
    }
}

#[async_trait]
impl GraphClient for BoltClient {
    async fn verify_connectivity(&self) -> Result<(), ClientError> {
        let (_permit, mut conn, mut reused) = self.pool.acquire().await?;
        loop {
            // RESET is a cheap round trip that proves the connection is live.
            let outcome = timeout(self.pool.connect_timeout, conn.reset())
                .await
                .map_err(|_| BoltError::Timeout(self.pool.connect_timeout))
                .and_then(|r| r);
            match outcome {
                Err(BoltError::Stale(e)) if reused => {
                    tracing::debug!(error = %e, "Idle connection was closed by the server; reconnecting");
                    conn.close().await;
                    conn = self.pool.open().await?;
                    reused = false;
                }
                outcome => {
                    if outcome.is_err() {
                        conn.mark_defunct();
                    }
                    self.pool.release(conn).await;
                    return outcome.map_err(ClientError::from);
                }
            }
        }
    }

    async fn session(&self, database: &str) -> Result<Box<dyn GraphSession>, ClientError> {
        let (permit, conn, reused) = self.pool.acquire().await?;
        Ok(Box::new(BoltSession {
            pool: self.pool.clone(),
            conn: Some(conn),
            reused,
            database: database.to_string(),
            _permit: permit,
        }))
    }

    async fn close(&self) {
        if self.pool.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pool.permits.close();

        let drained: Vec<Connection> = match self.pool.idle.lock() {
            Ok(mut idle) => idle.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        let count = drained.len();
        for conn in drained {
            conn.close().await;
        }
        tracing::info!(connections = count, "Bolt client closed");
    }
}

/// Session holding one pooled connection for its lifetime.
struct BoltSession {
    pool: Arc<Pool>,
    conn: Option<Connection>,
    /// The connection came from the idle pool and has not answered yet.
    reused: bool,
    database: String,
    _permit: OwnedSemaphorePermit,
}

#[async_trait]
impl GraphSession for BoltSession {
    async fn run(&mut self, query: &str, params: BoltMap) -> Result<RecordSet, ClientError> {
        loop {
            let conn = self.conn.as_mut().ok_or(ClientError::Closed)?;
            let limit = self.pool.query_timeout;
            let result = match timeout(limit, conn.run(query, &params, Some(self.database.as_str()))).await {
                Ok(result) => result,
                Err(_) => {
                    // The reply is still in flight; the stream cannot be reused.
                    conn.mark_defunct();
                    Err(BoltError::Timeout(limit))
                }
            };

            match result {
                Err(BoltError::Stale(e)) if self.reused => {
                    tracing::debug!(error = %e, "Idle connection was closed by the server; reconnecting");
                    self.reused = false;
                    if let Some(stale) = self.conn.take() {
                        stale.close().await;
                    }
                    self.conn = Some(self.pool.open().await?);
                }
                result => {
                    self.reused = false;
                    return result.map_err(ClientError::from);
                }
            }
        }
    }

    async fn close(mut self: Box<Self>) -> Result<(), ClientError> {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn).await;
        }
        Ok(())
    }
}
