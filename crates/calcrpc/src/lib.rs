//! # calcrpc
//!
//! Minimal framed RPC over TCP for four integer operations.
//!
//! A client sends `[tag][length][msgpack (a, b)]`; the server decodes it,
//! computes, and answers with `msgpack (result,)`. Each server connection
//! runs its own session task that keeps answering requests until the
//! peer hangs up or sends something it can't parse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use calcrpc::prelude::*;
//!
//! # async fn demo() -> Result<(), CalcRpcError> {
//! let server = CalcServer::builder().bind("127.0.0.1:12345").build().await?;
//! tokio::spawn(server.run());
//!
//! let client = Client::connect_to("127.0.0.1:12345");
//! assert_eq!(client.add(8, 9).await, 17);
//! assert_eq!(client.divide(10, 0).await, NOT_APPLICABLE);
//! # Ok(())
//! # }
//! ```

mod client;
mod dispatch;
mod error;
mod handler;
mod server;

pub use client::{Client, ClientConfig, RpcCall};
pub use dispatch::{dispatch, evaluate, respond};
pub use error::CalcRpcError;
pub use server::{CalcServer, CalcServerBuilder, DEFAULT_ADDR, ServerHandle};

/// Convenience re-exports for server and client code.
pub mod prelude {
    pub use crate::{
        CalcRpcError, CalcServer, CalcServerBuilder, Client, ClientConfig, RpcCall,
        ServerHandle, dispatch,
    };
    pub use calcrpc_protocol::{NOT_APPLICABLE, Operation, ProtocolError, Request};
    pub use calcrpc_session::SessionConfig;
    pub use calcrpc_transport::TransportError;
}
