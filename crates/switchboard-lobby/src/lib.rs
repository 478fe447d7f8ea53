//! Lobby and game phases for Switchboard.
//!
//! [`LobbyPhase`] is the first phase loaded into the engine. It admits
//! connections up to the configured player count, runs the
//! `JOIN`/`ACK` handshake, and replaces itself with a [`GamePhase`] built
//! from the final roster.

mod config;
mod error;
mod game;
mod lobby;
mod player;

pub use config::{LobbyConfig, LobbyState, PlayerState};
pub use error::{Denial, Verdict};
pub use game::{GameContext, GamePhase};
pub use lobby::{KICK_GAME_STARTING, LobbyContext, LobbyPhase};
pub use player::Player;
