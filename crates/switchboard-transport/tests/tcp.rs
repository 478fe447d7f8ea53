//! Integration tests for the TCP transport and the `Socket` impl.
//!
//! These spin up a real listener on a random loopback port and push bytes
//! through the non-blocking `try_read`/`try_write` path.

use std::io::ErrorKind;

use switchboard_transport::{Socket, TcpTransport, TransportError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[tokio::test]
async fn test_accept_and_try_read() {
    let transport = TcpTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport.local_addr().expect("should have local addr");

    let mut client = TcpStream::connect(addr).await.expect("should connect");
    let (server, peer) = transport.accept().await.expect("should accept");
    assert_eq!(peer, client.local_addr().unwrap());

    client.write_all(b"hello").await.unwrap();
    server.readable().await.unwrap();

    let mut buf = [0u8; 16];
    let n = Socket::try_read(&server, &mut buf).expect("data should be ready");
    assert_eq!(&buf[..n], b"hello");
}

#[tokio::test]
async fn test_try_read_would_block_when_idle() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap();

    let _client = TcpStream::connect(addr).await.unwrap();
    let (server, _) = transport.accept().await.unwrap();

    let mut buf = [0u8; 4];
    let err = Socket::try_read(&server, &mut buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[tokio::test]
async fn test_try_read_reports_eof_as_zero() {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap();

    let client = TcpStream::connect(addr).await.unwrap();
    let (server, _) = transport.accept().await.unwrap();
    drop(client);

    server.readable().await.unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(Socket::try_read(&server, &mut buf).unwrap(), 0);
}

#[tokio::test]
async fn test_bind_conflict_is_bind_failed() {
    let first = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = first.local_addr().unwrap().to_string();

    let second = TcpTransport::bind(&addr).await;
    assert!(matches!(second, Err(TransportError::BindFailed(_))));
}
