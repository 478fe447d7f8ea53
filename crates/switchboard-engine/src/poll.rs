//! Readiness multiplexing for the event loop.
//!
//! One wait covers the listening socket and every open connection of the
//! active phase. The interest set is rebuilt from the phase's roster on
//! every call, so connections a phase drops or gains are picked up on the
//! next iteration without separate registration.

use std::io;
use std::net::SocketAddr;

use futures_util::future::{self, BoxFuture, FutureExt};
use switchboard_transport::{TcpTransport, TransportError};
use tokio::net::TcpStream;

use crate::Connection;

/// What woke the event loop.
#[derive(Debug)]
pub enum Readiness {
    /// A client connected.
    Inbound(TcpStream, SocketAddr),
    /// At least one client connection is readable (or writable with
    /// output pending).
    Clients,
    /// Accepting failed. Usually transient (e.g. out of descriptors).
    AcceptFailed(TransportError),
}

/// Blocks until the listener or any of `connections` is ready.
///
/// Inbound connections win ties. Closed connections are not watched. A
/// connection's read side is watched until the peer's end-of-file, and its
/// write side only while it has buffered output.
pub async fn wait<'a>(transport: &TcpTransport, connections: Vec<&'a Connection>) -> Readiness {
    let mut interest: Vec<BoxFuture<'a, io::Result<()>>> = Vec::new();
    for conn in connections.into_iter().filter(|c| c.is_open()) {
        if conn.is_readable() {
            interest.push(conn.readable().boxed());
        }
        if conn.has_pending_output() {
            interest.push(conn.writable().boxed());
        }
    }

    let clients = async move {
        if interest.is_empty() {
            future::pending::<()>().await;
        }
        // Errors surface again when the connection is drained.
        let _ = future::select_all(interest).await;
    };

    tokio::select! {
        biased;
        accepted = transport.accept() => match accepted {
            Ok((stream, peer)) => Readiness::Inbound(stream, peer),
            Err(e) => Readiness::AcceptFailed(e),
        },
        () = clients => Readiness::Clients,
    }
}
