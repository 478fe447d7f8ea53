//! # Switchboard
//!
//! A small multiplayer session server. Clients connect over TCP, join a
//! lobby with an alias (and the lobby password, if one is set),
//! acknowledge `READY`, and are handed to the game phase together.
//!
//! ```rust,no_run
//! # async fn start() -> Result<(), switchboard::SwitchboardError> {
//! switchboard::run(2, None, ("0.0.0.0", 1337)).await
//! # }
//! ```
//!
//! The layers, leaves first:
//!
//! - [`transport`]: the listening socket and non-blocking socket seam.
//! - [`protocol`]: messages, the MessagePack codec, and length-prefixed framing.
//! - [`engine`]: opcode tables, phases, and ordered dispatch.
//! - [`lobby`]: the lobby state machine and the game handoff.
//! - [`board`]: card placement geometry for the game phase.

mod config;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::SwitchboardError;
pub use server::{ACCEPT_BACKOFF, Server, run};

pub use switchboard_board as board;
pub use switchboard_engine as engine;
pub use switchboard_lobby as lobby;
pub use switchboard_protocol as protocol;
pub use switchboard_transport as transport;

pub use switchboard_lobby::LobbyConfig;
