//! Server configuration.

use serde::{Deserialize, Serialize};
use switchboard_lobby::LobbyConfig;

/// Where to listen and what lobby to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub lobby: LobbyConfig,
}

impl ServerConfig {
    /// `host:port`, as handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1337,
            lobby: LobbyConfig::default(),
        }
    }
}
