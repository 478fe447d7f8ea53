//! TCP listening endpoint.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::TransportError;

/// The single listening stream-socket endpoint of a server process.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Waits for and accepts the next incoming connection.
    ///
    /// Cancel-safe: if the future is dropped before completing, no
    /// connection is lost. The event loop relies on this when it races
    /// `accept` against client readiness.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "could not set TCP_NODELAY");
        }
        tracing::debug!(%peer, "accepted TCP connection");
        Ok((stream, peer))
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
