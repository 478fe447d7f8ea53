//! Lobby configuration and state enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Settings for one lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Number of players the game needs. The lobby hands off once this
    /// many have joined and acknowledged.
    pub n_players: usize,

    /// Shared secret every `JOIN` must present. `None` admits anyone.
    pub password: Option<String>,
}

impl LobbyConfig {
    /// A lobby for `n_players` with an optional password.
    pub fn new(n_players: usize, password: Option<String>) -> Self {
        Self {
            n_players,
            password,
        }
    }
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            n_players: 4,
            password: None,
        }
    }
}

/// Where the lobby is in its handshake.
///
/// ```text
/// WaitingJoin → WaitingAck → (handed off to the game phase)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyState {
    /// Accepting connections and `JOIN` requests.
    WaitingJoin,
    /// Roster is final; waiting for every player to `ACK`.
    WaitingAck,
}

impl fmt::Display for LobbyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingJoin => f.write_str("WAITING_JOIN"),
            Self::WaitingAck => f.write_str("WAITING_ACK"),
        }
    }
}

/// Per-player handshake progress: `NotJoined → Joined → Ack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    NotJoined,
    Joined,
    Ack,
}

impl PlayerState {
    /// Returns `true` once the player holds an alias (joined or acked).
    pub fn has_joined(self) -> bool {
        matches!(self, Self::Joined | Self::Ack)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJoined => f.write_str("NOT_JOINED"),
            Self::Joined => f.write_str("JOINED"),
            Self::Ack => f.write_str("ACK"),
        }
    }
}
