//! The session registry: an arena of live server sessions.
//!
//! The registry holds bookkeeping only. Each session's connection, buffer
//! and phase are owned by the Tokio task running it; the task registers
//! on start, counts each answered request, and removes itself on close.
//!
//! `SessionRegistry` is not thread-safe by itself. The server wraps it in
//! a mutex and never holds that lock across network I/O.

use std::collections::HashMap;

use calcrpc_transport::ConnectionId;

use crate::{SessionError, SessionInfo};

/// Tracks every live session, keyed by connection.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, SessionInfo>,

    /// Requests answered across all sessions, including closed ones.
    requests_served: u64,

    /// Sessions ever registered.
    sessions_opened: u64,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session for a newly accepted connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyRegistered`] if the connection
    /// already has a live session.
    pub fn register(&mut self, info: SessionInfo) -> Result<(), SessionError> {
        let conn_id = info.conn_id;
        if self.sessions.contains_key(&conn_id) {
            return Err(SessionError::AlreadyRegistered(conn_id));
        }
        self.sessions.insert(conn_id, info);
        self.sessions_opened += 1;
        tracing::debug!(%conn_id, live = self.sessions.len(), "session registered");
        Ok(())
    }

    /// Counts one answered request, returning the session's new total.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the session is gone.
    pub fn record_request(&mut self, conn_id: ConnectionId) -> Result<u64, SessionError> {
        let session = self
            .sessions
            .get_mut(&conn_id)
            .ok_or(SessionError::NotFound(conn_id))?;
        session.requests += 1;
        self.requests_served += 1;
        Ok(session.requests)
    }

    /// Removes a session, returning its final record.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the session was never
    /// registered or was already removed.
    pub fn remove(&mut self, conn_id: ConnectionId) -> Result<SessionInfo, SessionError> {
        let info = self
            .sessions
            .remove(&conn_id)
            .ok_or(SessionError::NotFound(conn_id))?;
        tracing::debug!(
            %conn_id,
            requests = info.requests,
            live = self.sessions.len(),
            "session removed"
        );
        Ok(info)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Requests answered across the registry's lifetime.
    pub fn requests_served(&self) -> u64 {
        self.requests_served
    }

    /// Sessions registered across the registry's lifetime.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u64) -> SessionInfo {
        SessionInfo::new(ConnectionId::new(id))
    }

    #[test]
    fn test_register_counts_live_and_opened() {
        let mut registry = SessionRegistry::new();
        registry.register(info(1)).unwrap();
        registry.register(info(2)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.sessions_opened(), 2);
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = SessionRegistry::new();
        registry.register(info(1)).unwrap();
        let err = registry.register(info(1)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRegistered(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_record_request_unknown_session() {
        let mut registry = SessionRegistry::new();
        let err = registry.record_request(ConnectionId::new(9)).unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert_eq!(registry.requests_served(), 0);
    }

    #[test]
    fn test_request_counts_survive_removal() {
        let mut registry = SessionRegistry::new();
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(2);
        registry.register(info(1)).unwrap();
        registry.register(info(2)).unwrap();

        assert_eq!(registry.record_request(a).unwrap(), 1);
        assert_eq!(registry.record_request(a).unwrap(), 2);
        assert_eq!(registry.record_request(b).unwrap(), 1);

        let removed = registry.remove(a).unwrap();
        assert_eq!(removed.requests, 2);

        assert_eq!(registry.requests_served(), 3);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sessions_opened(), 2);
    }

    #[test]
    fn test_remove_twice_fails() {
        let mut registry = SessionRegistry::new();
        let id = ConnectionId::new(1);
        registry.register(info(1)).unwrap();
        registry.remove(id).unwrap();
        assert!(matches!(
            registry.remove(id),
            Err(SessionError::NotFound(_))
        ));
        assert!(registry.is_empty());
    }
}
