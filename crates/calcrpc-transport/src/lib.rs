//! Transport abstraction layer for calcrpc.
//!
//! Provides the [`Transport`] and [`Connection`] traits over a reliable,
//! ordered byte stream, plus the TCP implementation used by both the
//! server and the client.
//!
//! Unlike a message-oriented transport, a [`Connection`] here exposes
//! exact-length reads: framing is the protocol layer's job, the transport
//! only guarantees that a read returns either every requested byte or an
//! error.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A single bidirectional byte stream.
///
/// Methods take `&mut self`: a connection is owned by exactly one session
/// and never has two reads or two writes outstanding at once.
pub trait Connection: Send + 'static {
    /// Fills `buf` completely.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectionClosed`] if the peer hangs up
    /// before `buf` is full, or [`TransportError::ReceiveFailed`] on any
    /// other I/O error.
    fn read_exact(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Reads whatever is available into `buf`, returning the byte count.
    ///
    /// `Ok(0)` means the peer closed its write half.
    fn read_some(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<usize, TransportError>> + Send;

    /// Writes all of `data` to the peer.
    fn write_all(
        &mut self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Shuts down the write half, signalling EOF to the peer.
    fn close(
        &mut self,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the remote address, if known.
    fn peer_addr(&self) -> Option<SocketAddr>;
}
