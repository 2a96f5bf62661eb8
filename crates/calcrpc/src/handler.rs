//! Per-connection server session.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is a loop over one request at a time:
//!   1. Read the 4-byte tag → validate the operation
//!   2. Read the 4-byte length → check it fits the frame
//!   3. Read the payload → decode the operand pair
//!   4. Dispatch and write the response → back to 1
//!
//! Any failure ends the session and drops the connection. There is no
//! resynchronization: once a frame is bad, the offset of the next one is
//! unknowable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use calcrpc_protocol::{
    MAX_PAYLOAD_LEN, check_payload_len, decode_length, decode_operands,
    decode_request_header, encode_response,
};
use calcrpc_session::{SessionInfo, SessionPhase};
use calcrpc_transport::{Connection, ConnectionId, TransportError};

use crate::CalcRpcError;
use crate::dispatch::dispatch;
use crate::server::ServerState;

/// Drop guard that deregisters a session when its task ends.
///
/// Cleanup runs even if the session panics. `Drop` is synchronous, so the
/// async registry lock is taken in a fire-and-forget task.
struct SessionGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = state.registry.lock().await.remove(conn_id);
            });
        }
    }
}

/// Handles a single connection from accept to close.
///
/// Returns `Ok(())` when the peer closes the connection between requests.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    state: Arc<ServerState>,
) -> Result<(), CalcRpcError> {
    let conn_id = conn.id();
    state
        .registry
        .lock()
        .await
        .register(SessionInfo::new(conn_id))?;
    let _guard = SessionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    tracing::debug!(%conn_id, peer = ?conn.peer_addr(), "session started");
    ServerSession::new(conn, state).run().await
}

/// The read → dispatch → write state machine for one connection.
struct ServerSession<C: Connection> {
    conn: C,
    state: Arc<ServerState>,
    phase: SessionPhase,
    buffer: Vec<u8>,
}

impl<C: Connection> ServerSession<C> {
    fn new(conn: C, state: Arc<ServerState>) -> Self {
        Self {
            conn,
            state,
            phase: SessionPhase::AwaitTag,
            buffer: vec![0; MAX_PAYLOAD_LEN],
        }
    }

    async fn run(mut self) -> Result<(), CalcRpcError> {
        let result = self.serve().await;
        let ended_in = std::mem::replace(&mut self.phase, SessionPhase::Closed);
        let conn_id = self.conn.id();
        match &result {
            Ok(()) => tracing::debug!(%conn_id, "peer closed session"),
            Err(e) => tracing::debug!(
                %conn_id, phase = %ended_in, error = %e, "closing session"
            ),
        }
        result
    }

    async fn serve(&mut self) -> Result<(), CalcRpcError> {
        let conn_id = self.conn.id();
        let idle = self.state.config.idle_timeout;
        let io = self.state.config.io_timeout;

        loop {
            // --- AwaitTag ---
            self.enter(SessionPhase::AwaitTag);
            let mut tag = [0u8; 4];
            match with_timeout(idle, "idle wait", self.conn.read_exact(&mut tag)).await {
                Ok(()) => {}
                // EOF between requests is the normal way a session ends.
                Err(e) if e.is_closed() => return Ok(()),
                Err(e) => return Err(e),
            }
            let op = decode_request_header(tag)?;

            // --- AwaitLength ---
            self.enter(SessionPhase::AwaitLength);
            let mut len = [0u8; 4];
            with_timeout(io, "length read", self.conn.read_exact(&mut len)).await?;
            let len = check_payload_len(decode_length(len))?;

            // --- AwaitPayload ---
            self.enter(SessionPhase::AwaitPayload);
            let payload = &mut self.buffer[..len];
            with_timeout(io, "payload read", self.conn.read_exact(payload)).await?;
            let (a, b) = decode_operands(&self.buffer[..len])?;

            // --- Dispatching ---
            self.enter(SessionPhase::Dispatching);
            let result = dispatch(op, a, b);
            let response = encode_response(result)?;
            let served = self.state.registry.lock().await.record_request(conn_id)?;
            tracing::debug!(%conn_id, %op, a, b, result, served, "request answered");
            with_timeout(io, "response write", self.conn.write_all(&response)).await?;
        }
    }

    /// Moves to `phase`, which stays local to this task.
    fn enter(&mut self, phase: SessionPhase) {
        self.phase = phase;
        tracing::trace!(conn_id = %self.conn.id(), %phase, "session phase");
    }
}

/// Runs one transport step, optionally bounded by `limit`.
async fn with_timeout<T>(
    limit: Option<Duration>,
    what: &'static str,
    step: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, CalcRpcError> {
    match limit {
        Some(after) => match tokio::time::timeout(after, step).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CalcRpcError::Timeout { what, after }),
        },
        None => Ok(step.await?),
    }
}
