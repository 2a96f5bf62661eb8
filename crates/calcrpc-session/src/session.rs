//! Session types: configuration, lifecycle phase, and the per-session
//! record kept by the registry.

use std::fmt;
use std::time::Duration;

use calcrpc_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timeouts applied to every server session.
///
/// Either timeout can be disabled with `None`, in which case a stalled
/// peer holds its session open indefinitely.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session waits for the first byte of the next request
    /// before closing the connection.
    ///
    /// Default: 60 seconds.
    pub idle_timeout: Option<Duration>,

    /// How long each remaining read of a request, and the response write,
    /// may take once a request has started arriving.
    ///
    /// Default: 10 seconds.
    pub io_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(60)),
            io_timeout: Some(Duration::from_secs(10)),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a server session is in its request cycle.
///
/// ```text
///   AwaitTag ─→ AwaitLength ─→ AwaitPayload ─→ Dispatching ─┐
///      ↑                                                    │
///      └────────────────────────────────────────────────────┘
///
///   any phase ──(EOF, I/O error, bad frame, timeout)──→ Closed
/// ```
///
/// Only one transition's I/O is ever in flight; the next phase starts
/// once the previous read or write has fully completed. The phase is
/// private to the task running the session and never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the 4-byte operation tag of the next request.
    AwaitTag,
    /// Waiting for the 4-byte payload length.
    AwaitLength,
    /// Waiting for the operand payload.
    AwaitPayload,
    /// Computing and writing the response.
    Dispatching,
    /// Terminal: the connection is finished.
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::AwaitTag => "await-tag",
            SessionPhase::AwaitLength => "await-length",
            SessionPhase::AwaitPayload => "await-payload",
            SessionPhase::Dispatching => "dispatching",
            SessionPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SessionInfo
// ---------------------------------------------------------------------------

/// The registry's record of one live session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// The connection this session owns.
    pub conn_id: ConnectionId,

    /// Requests answered on this connection so far.
    pub requests: u64,
}

impl SessionInfo {
    /// Creates the record for a freshly accepted connection.
    pub fn new(conn_id: ConnectionId) -> Self {
        Self {
            conn_id,
            requests: 0,
        }
    }
}
