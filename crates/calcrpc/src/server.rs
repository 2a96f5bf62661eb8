//! `CalcServer` builder and accept loop.
//!
//! This is the entry point for running a calcrpc server. It ties together
//! the layers: transport → session registry → per-connection handler.

use std::future::Future;
use std::sync::Arc;

use calcrpc_session::{SessionConfig, SessionRegistry};
use calcrpc_transport::{Connection, TcpTransport, Transport};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::CalcRpcError;
use crate::handler::handle_connection;

/// Address used when none is configured.
pub const DEFAULT_ADDR: &str = "127.0.0.1:12345";

/// Shared server state passed to each session task.
///
/// Sessions never share mutable request state; the registry only holds
/// bookkeeping, and its lock is never held across network I/O.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) config: SessionConfig,
}

/// Builder for configuring and starting a calcrpc server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), calcrpc::CalcRpcError> {
/// use calcrpc::CalcServer;
///
/// let server = CalcServer::builder().bind("0.0.0.0:12345").build().await?;
/// server.run().await
/// # }
/// ```
pub struct CalcServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl CalcServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-session timeouts.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener. Connections are not accepted until
    /// [`CalcServer::run`] is called.
    pub async fn build(self) -> Result<CalcServer, CalcRpcError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(SessionRegistry::new()),
            config: self.session_config,
        });

        Ok(CalcServer { transport, state })
    }
}

impl Default for CalcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound calcrpc server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct CalcServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl CalcServer {
    /// Creates a new builder.
    pub fn builder() -> CalcServerBuilder {
        CalcServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle for observing the server while it runs.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), CalcRpcError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Each accepted connection gets its own session task. When `shutdown`
    /// fires, the listener stops accepting and every open session is
    /// aborted.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), CalcRpcError> {
        tracing::info!(addr = ?self.local_addr().ok(), "calcrpc server running");

        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        sessions.spawn(async move {
                            let conn_id = conn.id();
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    %conn_id,
                                    error = %e,
                                    "session ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },

                // Reap finished sessions so the set only holds live ones.
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "session task panicked");
                        }
                    }
                }
            }
        }

        tracing::info!(open = sessions.len(), "calcrpc server stopping");
        sessions.shutdown().await;
        Ok(())
    }
}

/// A cloneable view of a running server's session registry.
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<ServerState>,
}

impl ServerHandle {
    /// Number of sessions currently open.
    ///
    /// A closing session deregisters from a separately spawned task, so
    /// this count can briefly include sessions whose connection is
    /// already gone.
    pub async fn active_sessions(&self) -> usize {
        self.state.registry.lock().await.len()
    }

    /// Requests answered since the server started.
    pub async fn requests_served(&self) -> u64 {
        self.state.registry.lock().await.requests_served()
    }

    /// Connections accepted since the server started.
    pub async fn sessions_opened(&self) -> u64 {
        self.state.registry.lock().await.sessions_opened()
    }
}
