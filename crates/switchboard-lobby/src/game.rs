//! The game phase: the handoff target of the lobby.
//!
//! Game rules are not implemented yet. The phase takes over the lobby's
//! final roster, announces `START`, and turns away late connections.

use switchboard_engine::{Connection, HandlerError, OpTable, Phase};
use switchboard_protocol::{GameClientOp, LobbyClientOp, LobbyErrorCode, Opcode, Value};
use switchboard_transport::ConnectionId;
use tracing::{debug, info};

use crate::Player;

/// State shared by the game's operations.
#[derive(Debug)]
pub struct GameContext {
    players: Vec<Player>,
}

impl GameContext {
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Aliases in seating (join) order.
    pub fn roster(&self) -> Vec<&str> {
        self.players.iter().filter_map(Player::alias).collect()
    }

    pub fn broadcast(&mut self, opcode: impl Into<Opcode>, args: Vec<Value>) {
        let opcode = opcode.into();
        for player in &mut self.players {
            player.send(opcode, args.clone());
        }
    }
}

/// Runs after the lobby. Installs no catch hook: any handler failure here
/// is fatal.
pub struct GamePhase {
    ctx: GameContext,
    ops: OpTable<GameContext>,
}

impl GamePhase {
    /// Builds the game from the lobby's final roster and broadcasts `START`.
    pub fn from_lobby(players: Vec<Player>) -> Self {
        info!(players = players.len(), "initing game");

        let mut phase = Self {
            ctx: GameContext { players },
            ops: OpTable::new(),
        };

        info!("sending game state to players");
        phase.ctx.broadcast(GameClientOp::Start, Vec::new());
        info!(roster = ?phase.ctx.roster(), "game has started");
        phase
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }
}

impl Phase for GamePhase {
    fn name(&self) -> &'static str {
        "game"
    }

    fn op_name(&self, opcode: Opcode) -> Option<&'static str> {
        self.ops.name(opcode)
    }

    fn handle(&mut self, opcode: Opcode, origin: ConnectionId, args: &[Value]) -> Result<(), HandlerError> {
        self.ops.dispatch(&mut self.ctx, opcode, origin, args)
    }

    fn on_tick(&mut self) -> Option<Box<dyn Phase>> {
        None
    }

    fn accept(&mut self, mut conn: Connection) {
        debug!(conn = %conn.id(), peer = %conn.peer(), "denied: game in progress");
        conn.notify(LobbyClientOp::Error, vec![LobbyErrorCode::Full.into()]);
        conn.close();
    }

    fn connections(&self) -> Vec<&Connection> {
        self.ctx.players.iter().map(Player::connection).collect()
    }

    fn connections_mut(&mut self) -> Vec<&mut Connection> {
        self.ctx.players.iter_mut().map(Player::connection_mut).collect()
    }
}
