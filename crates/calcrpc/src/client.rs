//! Client side: one RPC call per connection.
//!
//! A [`Client`] only remembers where the server is. Every call builds a
//! fresh [`RpcCall`], which owns its connection and receive buffer, runs
//! connect → write → read strictly in order, and is consumed when the
//! result comes back. Nothing is pooled or pipelined, so any number of
//! calls can run concurrently from independent tasks.

use std::time::Duration;

use calcrpc_protocol::{
    MAX_FRAME_SIZE, NOT_APPLICABLE, Operation, ProtocolError, Request, encode_request,
    pad_frame, try_decode_response,
};
use calcrpc_transport::{Connection, TcpConnection, TransportError};

use crate::CalcRpcError;
use crate::server::DEFAULT_ADDR;

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Where and how a [`Client`] sends its calls.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, as `host:port`.
    pub endpoint: String,

    /// Upper bound on a whole call, connect included. `None` waits
    /// forever.
    ///
    /// Default: 10 seconds.
    pub timeout: Option<Duration>,

    /// Whether to zero-pad each request to the full frame size.
    ///
    /// Padding matches what fixed-buffer peers expect on the wire. The
    /// server answers, then closes the connection on reading the padding
    /// as tag 0.
    ///
    /// Default: `true`.
    pub pad_to_frame: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ADDR.to_string(),
            timeout: Some(Duration::from_secs(10)),
            pad_to_frame: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Issues arithmetic calls against one server endpoint.
///
/// ```rust,no_run
/// # async fn demo() {
/// use calcrpc::Client;
///
/// let client = Client::connect_to("127.0.0.1:12345");
/// assert_eq!(client.add(8, 9).await, 17);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Creates a client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Creates a client for `endpoint` with default settings.
    pub fn connect_to(endpoint: impl Into<String>) -> Self {
        Self::new(ClientConfig {
            endpoint: endpoint.into(),
            ..ClientConfig::default()
        })
    }

    /// Returns the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs one call and returns the result.
    ///
    /// Failures of any kind (unreachable server, dropped connection,
    /// undecodable response, timeout) are logged and reported as
    /// [`NOT_APPLICABLE`]. Use [`try_call`](Self::try_call) to see the
    /// error itself.
    pub async fn call(&self, op: Operation, a: i32, b: i32) -> i32 {
        match self.try_call(op, a, b).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.config.endpoint,
                    %op,
                    error = %e,
                    "rpc call failed"
                );
                NOT_APPLICABLE
            }
        }
    }

    /// Performs one call, surfacing any failure.
    ///
    /// # Errors
    /// - [`TransportError::ConnectFailed`] if the server is unreachable
    /// - [`TransportError::ConnectionClosed`] if the server hangs up
    ///   before a complete response arrives
    /// - [`CalcRpcError::Timeout`] if the configured limit elapses
    pub async fn try_call(&self, op: Operation, a: i32, b: i32) -> Result<i32, CalcRpcError> {
        let call = RpcCall::new(op, a, b);
        match self.config.timeout {
            Some(after) => tokio::time::timeout(after, call.execute(&self.config))
                .await
                .map_err(|_| CalcRpcError::Timeout {
                    what: "rpc call",
                    after,
                })?,
            None => call.execute(&self.config).await,
        }
    }

    /// `a + b`, wrapping on overflow.
    pub async fn add(&self, a: i32, b: i32) -> i32 {
        self.call(Operation::Add, a, b).await
    }

    /// `a - b`, wrapping on overflow.
    pub async fn subtract(&self, a: i32, b: i32) -> i32 {
        self.call(Operation::Subtract, a, b).await
    }

    /// `a * b`, wrapping on overflow.
    pub async fn multiply(&self, a: i32, b: i32) -> i32 {
        self.call(Operation::Multiply, a, b).await
    }

    /// `a / b` truncated toward zero, or [`NOT_APPLICABLE`] when `b == 0`.
    pub async fn divide(&self, a: i32, b: i32) -> i32 {
        self.call(Operation::Divide, a, b).await
    }
}

// ---------------------------------------------------------------------------
// RpcCall
// ---------------------------------------------------------------------------

/// One outstanding request.
///
/// Owns the receive buffer for its lifetime and is consumed by
/// [`execute`](Self::execute), so a call can never be replayed over a
/// stale connection.
#[derive(Debug)]
pub struct RpcCall {
    request: Request,
    buffer: Vec<u8>,
}

impl RpcCall {
    /// Prepares a call; nothing touches the network yet.
    pub fn new(op: Operation, a: i32, b: i32) -> Self {
        Self {
            request: Request { op, a, b },
            buffer: vec![0; MAX_FRAME_SIZE],
        }
    }

    /// The request this call will send.
    pub fn request(&self) -> Request {
        self.request
    }

    /// Connects, sends the request, and waits for the result.
    pub async fn execute(mut self, config: &ClientConfig) -> Result<i32, CalcRpcError> {
        let Request { op, a, b } = self.request;

        let mut conn = TcpConnection::connect(&config.endpoint).await?;
        let conn_id = conn.id();
        tracing::debug!(%conn_id, endpoint = %config.endpoint, request = %self.request, "rpc call started");

        let mut frame = encode_request(op, a, b)?;
        if config.pad_to_frame {
            frame = pad_frame(frame);
        }
        conn.write_all(&frame).await?;

        let result = read_response(&mut conn, &mut self.buffer).await?;
        tracing::debug!(%conn_id, result, "rpc call finished");
        Ok(result)
    }
}

/// Reads until `buffer` holds one complete response.
async fn read_response<C: Connection>(
    conn: &mut C,
    buffer: &mut [u8],
) -> Result<i32, CalcRpcError> {
    let mut filled = 0;
    loop {
        if filled == buffer.len() {
            return Err(ProtocolError::MalformedPayload(format!(
                "no complete response in {filled} bytes"
            ))
            .into());
        }
        let n = conn.read_some(&mut buffer[filled..]).await?;
        if n == 0 {
            return Err(TransportError::ConnectionClosed(format!(
                "{} closed after {filled} response bytes",
                conn.id()
            ))
            .into());
        }
        filled += n;
        if let Some((result, _)) = try_decode_response(&buffer[..filled])? {
            return Ok(result);
        }
    }
}
