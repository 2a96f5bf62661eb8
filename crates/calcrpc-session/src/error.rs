//! Error types for the session registry.

use calcrpc_transport::ConnectionId;

/// Errors raised while registering or updating sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live session exists for the connection.
    #[error("session not found for {0}")]
    NotFound(ConnectionId),

    /// A session is already registered for the connection.
    #[error("{0} already has a session")]
    AlreadyRegistered(ConnectionId),
}
