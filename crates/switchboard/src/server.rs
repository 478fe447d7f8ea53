//! The event loop.
//!
//! ```text
//! wait(listener + phase connections)
//!   ├─ Inbound  → engine.accept
//!   └─ Clients  ─┐
//!                ▼
//! engine.pump → engine.process → engine.state_check → (loop)
//! ```
//!
//! Everything runs on one task. The readiness wait is the only place the
//! loop yields, so handlers never interleave. A failed accept pauses the
//! loop briefly instead of spinning on a listener that keeps failing.

use std::net::SocketAddr;
use std::time::Duration;

use switchboard_engine::{Connection, Engine, Readiness, wait};
use switchboard_lobby::{LobbyConfig, LobbyPhase};
use switchboard_transport::TcpTransport;
use tracing::{info, warn};

use crate::{ServerConfig, SwitchboardError};

/// Pause after a failed accept (e.g. out of file descriptors).
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound server with its lobby loaded.
pub struct Server {
    transport: TcpTransport,
    engine: Engine,
}

impl Server {
    /// Binds the listener and loads the lobby phase.
    ///
    /// # Errors
    /// [`SwitchboardError::Config`] for a lobby of zero players;
    /// [`SwitchboardError::Transport`] if the address cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, SwitchboardError> {
        if config.lobby.n_players == 0 {
            return Err(SwitchboardError::Config("player count must be at least 1".into()));
        }
        info!(addr = %config.bind_addr(), "starting server");

        let transport = TcpTransport::bind(&config.bind_addr()).await?;
        let engine = Engine::new(Box::new(LobbyPhase::new(config.lobby)));
        Ok(Self { transport, engine })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs the loop until a fatal error.
    pub async fn run(mut self) -> Result<(), SwitchboardError> {
        info!("server running");
        loop {
            self.step().await?;
        }
    }

    /// One loop iteration: wait, drain, process, state check.
    pub async fn step(&mut self) -> Result<(), SwitchboardError> {
        let ready = wait(&self.transport, self.engine.phase().connections()).await;
        self.on_ready(ready).await;

        self.engine.pump();
        self.engine.process()?;
        self.engine.state_check();
        Ok(())
    }

    async fn on_ready(&mut self, ready: Readiness) {
        match ready {
            Readiness::Inbound(stream, peer) => {
                self.engine.accept(Connection::new(stream, peer));
            }
            Readiness::Clients => {}
            Readiness::AcceptFailed(e) => {
                warn!(error = %e, backoff = ?ACCEPT_BACKOFF, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Binds `host:port`, runs a lobby for `player_count` players, and serves
/// until a fatal error.
pub async fn run(
    player_count: usize,
    password: Option<String>,
    (host, port): (impl Into<String>, u16),
) -> Result<(), SwitchboardError> {
    let config = ServerConfig {
        host: host.into(),
        port,
        lobby: LobbyConfig::new(player_count, password),
    };
    Server::bind(config).await?.run().await
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Instant;

    use switchboard_transport::TransportError;

    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            lobby: LobbyConfig::new(1, None),
        }
    }

    #[tokio::test]
    async fn test_failed_accept_backs_off() {
        let mut server = Server::bind(config()).await.unwrap();
        let emfile = io::Error::other("too many open files");

        let started = Instant::now();
        server
            .on_ready(Readiness::AcceptFailed(TransportError::AcceptFailed(emfile)))
            .await;

        assert!(started.elapsed() >= ACCEPT_BACKOFF);
        assert!(server.engine().phase().connections().is_empty());
    }

    #[tokio::test]
    async fn test_clients_readiness_returns_at_once() {
        let mut server = Server::bind(config()).await.unwrap();

        let started = Instant::now();
        server.on_ready(Readiness::Clients).await;

        assert!(started.elapsed() < ACCEPT_BACKOFF);
    }
}
