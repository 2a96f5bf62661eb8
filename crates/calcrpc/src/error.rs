//! Unified error type for calcrpc.

use std::time::Duration;

use calcrpc_protocol::ProtocolError;
use calcrpc_session::SessionError;
use calcrpc_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CalcRpcError {
    /// A transport-level error (connect, send, receive, peer closed).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (unknown tag, malformed payload, oversize).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session registry error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An I/O step did not finish within its configured limit.
    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },
}

impl CalcRpcError {
    /// Returns `true` if the peer simply hung up.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcrpc_transport::ConnectionId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let rpc_err: CalcRpcError = err.into();
        assert!(matches!(rpc_err, CalcRpcError::Transport(_)));
        assert!(rpc_err.is_closed());
        assert!(rpc_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let rpc_err: CalcRpcError = ProtocolError::UnknownTag(99).into();
        assert!(matches!(rpc_err, CalcRpcError::Protocol(_)));
        assert!(!rpc_err.is_closed());
        assert_eq!(rpc_err.to_string(), "unknown operation tag 99");
    }

    #[test]
    fn test_from_session_error() {
        let rpc_err: CalcRpcError = SessionError::NotFound(ConnectionId::new(4)).into();
        assert!(matches!(rpc_err, CalcRpcError::Session(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = CalcRpcError::Timeout {
            what: "payload read",
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "payload read timed out after 250ms");
    }
}
