//! TCP transport implementation using `tokio::net`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> ConnectionId {
    ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;

    async fn accept(&mut self) -> Result<TcpConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let conn = TcpConnection::from_stream(stream, Some(addr))?;
        tracing::debug!(id = %conn.id, %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single TCP connection with Nagle's algorithm disabled.
pub struct TcpConnection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    stream: TcpStream,
}

impl TcpConnection {
    /// Opens an outbound connection to `addr`.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectFailed`] if the endpoint is
    /// unreachable or refuses the connection.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        let peer = stream.peer_addr().ok();
        Self::from_stream(stream, peer)
    }

    fn from_stream(
        stream: TcpStream,
        peer: Option<SocketAddr>,
    ) -> Result<Self, TransportError> {
        // Requests are small and latency-bound; don't let them coalesce.
        stream.set_nodelay(true).map_err(TransportError::SendFailed)?;
        Ok(Self {
            id: next_id(),
            peer,
            stream,
        })
    }
}

impl Connection for TcpConnection {
    async fn read_exact(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        match self.stream.read_exact(buf).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(TransportError::ConnectionClosed(format!(
                    "{} closed by peer",
                    self.id
                )))
            }
            Err(e) => Err(TransportError::ReceiveFailed(e)),
        }
    }

    async fn read_some(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        self.stream
            .read(buf)
            .await
            .map_err(TransportError::ReceiveFailed)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}
