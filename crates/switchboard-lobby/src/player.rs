//! Lobby-phase players.

use switchboard_engine::Connection;
use switchboard_protocol::{Opcode, Value};
use switchboard_transport::ConnectionId;

use crate::PlayerState;

/// A connection taking part in the lobby handshake.
#[derive(Debug)]
pub struct Player {
    connection: Connection,
    state: PlayerState,
    alias: Option<String>,
}

impl Player {
    /// A fresh, not-yet-joined player.
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            state: PlayerState::NotJoined,
            alias: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Set once the player has joined.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Fire-and-forget send.
    pub fn send(&mut self, opcode: impl Into<Opcode>, args: Vec<Value>) {
        self.connection.notify(opcode, args);
    }

    pub(crate) fn mark_joined(&mut self, alias: &str) {
        self.state = PlayerState::Joined;
        self.alias = Some(alias.to_string());
    }

    pub(crate) fn mark_acked(&mut self) {
        self.state = PlayerState::Ack;
    }

    /// Sends a final notice and closes the connection.
    pub(crate) fn kick(&mut self, opcode: impl Into<Opcode>, args: Vec<Value>) {
        self.send(opcode, args);
        self.connection.close();
    }
}
