//! Integration tests for the client: failure reporting, timeouts, and
//! frame padding, checked against stub listeners as well as a real server.

use std::time::Duration;

use calcrpc::prelude::*;
use calcrpc_protocol::{HEADER_LEN, MAX_FRAME_SIZE, decode_request};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Returns an address with nothing listening on it.
async fn dead_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

async fn start_server() -> String {
    let server = CalcServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(server.run());
    addr
}

#[tokio::test]
async fn test_unreachable_server_yields_sentinel() {
    let client = Client::connect_to(dead_addr().await);
    assert_eq!(client.add(8, 9).await, NOT_APPLICABLE);
}

#[tokio::test]
async fn test_unreachable_server_reports_connect_error() {
    let client = Client::connect_to(dead_addr().await);
    let err = client
        .try_call(Operation::Add, 8, 9)
        .await
        .expect_err("nothing is listening");
    assert!(
        matches!(
            err,
            CalcRpcError::Transport(TransportError::ConnectFailed { .. })
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    // Accept and hold the connection without ever answering.
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let client = Client::new(ClientConfig {
        endpoint: addr,
        timeout: Some(Duration::from_millis(100)),
        ..ClientConfig::default()
    });
    let err = client
        .try_call(Operation::Multiply, 2, 3)
        .await
        .expect_err("no response should arrive");
    assert!(matches!(err, CalcRpcError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_server_hanging_up_is_a_closed_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut frame = vec![0u8; MAX_FRAME_SIZE];
        socket.read_exact(&mut frame).await.unwrap();
        // Half a response, then EOF.
        socket.write_all(&[0x91]).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    let err = Client::connect_to(addr)
        .try_call(Operation::Subtract, 1, 1)
        .await
        .expect_err("response is incomplete");
    assert!(err.is_closed(), "got {err:?}");
}

#[tokio::test]
async fn test_client_sends_padded_frame_and_reads_split_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let stub = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut frame = vec![0u8; MAX_FRAME_SIZE];
        socket.read_exact(&mut frame).await.unwrap();
        let request = decode_request(&frame).unwrap();

        // Send -3000 as msgpack `[int16]` one byte at a time.
        for byte in [0x91, 0xd1, 0xf4, 0x48] {
            socket.write_all(&[byte]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        (request, frame)
    });

    let result = Client::connect_to(addr)
        .try_call(Operation::Divide, 10, 0)
        .await
        .unwrap();
    assert_eq!(result, NOT_APPLICABLE);

    let (request, frame) = stub.await.unwrap();
    assert_eq!(
        request,
        Request {
            op: Operation::Divide,
            a: 10,
            b: 0
        }
    );
    assert!(frame[HEADER_LEN + 3..].iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_unpadded_calls_against_real_server() {
    let addr = start_server().await;
    let client = Client::new(ClientConfig {
        endpoint: addr,
        pad_to_frame: false,
        ..ClientConfig::default()
    });

    assert_eq!(client.add(-5, 5).await, 0);
    assert_eq!(client.subtract(3, 10).await, -7);
    assert_eq!(client.multiply(1 << 20, 1 << 12).await, 0);
    assert_eq!(client.divide(100, 7).await, 14);
}

#[tokio::test]
async fn test_rpc_call_executes_once() {
    let addr = start_server().await;
    let config = ClientConfig {
        endpoint: addr,
        ..ClientConfig::default()
    };

    let call = RpcCall::new(Operation::Add, 40, 2);
    assert_eq!(call.request().a, 40);
    assert_eq!(call.execute(&config).await.unwrap(), 42);
}

#[tokio::test]
async fn test_no_timeout_still_completes() {
    let addr = start_server().await;
    let client = Client::new(ClientConfig {
        endpoint: addr,
        timeout: None,
        ..ClientConfig::default()
    });
    assert_eq!(client.call(Operation::Divide, -9, 2).await, -4);
}
