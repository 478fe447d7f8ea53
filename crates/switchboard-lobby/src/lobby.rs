//! The lobby: admission, the join/ack handshake, and the handoff to the
//! game phase.
//!
//! ```text
//!              JOIN ok                n joined
//! NOT_JOINED ─────────→ JOINED ──┐  ─────────────→ WAITING_ACK, READY
//!      │                  │ ACK  │                        │
//!      │                  ▼      │                        │ all ACK
//!      │                 ACK ────┘                        ▼
//!      └── KICK + close at the WAITING_ACK boundary    GamePhase, START
//! ```

use switchboard_engine::{Args, Connection, HandlerError, OpTable, Phase, Recovery};
use switchboard_protocol::{LobbyClientOp, LobbyServerOp, Opcode, Value};
use switchboard_transport::ConnectionId;
use tracing::{debug, info};

use crate::{Denial, GamePhase, LobbyConfig, LobbyState, Player, PlayerState, Verdict};

/// Reason carried by the `KICK` sent to players that never joined.
pub const KICK_GAME_STARTING: &str = "game is starting";

/// State shared by the lobby's operations.
#[derive(Debug)]
pub struct LobbyContext {
    config: LobbyConfig,
    state: LobbyState,
    players: Vec<Player>,
}

impl LobbyContext {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            state: LobbyState::WaitingJoin,
            players: Vec::new(),
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    /// Every player, in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    fn player_mut(&mut self, id: ConnectionId) -> Result<&mut Player, HandlerError> {
        self.players
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(HandlerError::UnknownConnection(id))
    }

    /// Number of players in `state`.
    pub fn count(&self, state: PlayerState) -> usize {
        self.players.iter().filter(|p| p.state() == state).count()
    }

    /// Number of players holding an alias.
    pub fn joined(&self) -> usize {
        self.players.iter().filter(|p| p.state().has_joined()).count()
    }

    /// Aliases of every joined player, in join order.
    pub fn roster(&self) -> Vec<String> {
        self.players
            .iter()
            .filter_map(|p| p.alias().map(str::to_string))
            .collect()
    }

    fn is_full(&self) -> bool {
        self.joined() >= self.config.n_players
    }

    /// Sends a message to every player, in join order.
    pub fn broadcast(&mut self, opcode: impl Into<Opcode>, args: Vec<Value>) {
        let opcode = opcode.into();
        for player in &mut self.players {
            player.send(opcode, args.clone());
        }
    }

    /// Admits `conn` as a new player, or answers `ERROR(FULL)` and closes it.
    pub fn admit(&mut self, mut conn: Connection) -> Verdict {
        if self.state != LobbyState::WaitingJoin || self.is_full() {
            conn.notify(LobbyClientOp::Error, vec![Denial::Full.code().into()]);
            conn.close();
            return Err(Denial::Full);
        }
        self.players.push(Player::new(conn));
        Ok(())
    }

    /// Handles `JOIN(alias, password)` from `origin`.
    ///
    /// On success every player, the new one included, is told `JOINED`
    /// with the new alias and the updated roster.
    ///
    /// # Errors
    /// [`HandlerError::UnknownConnection`] if no player owns `origin`.
    pub fn join(
        &mut self,
        origin: ConnectionId,
        alias: &str,
        password: Option<&str>,
    ) -> Result<Verdict, HandlerError> {
        let verdict = self.check_join(origin, alias, password)?;
        if verdict.is_ok() {
            let player = self.player_mut(origin)?;
            player.mark_joined(alias);
            info!(conn = %origin, peer = %player.connection().peer(), alias, "joined");

            let roster = self.roster();
            self.broadcast(LobbyClientOp::Joined, vec![alias.into(), roster.into()]);
        }
        self.answer(origin, verdict)?;
        Ok(verdict)
    }

    fn check_join(
        &self,
        origin: ConnectionId,
        alias: &str,
        password: Option<&str>,
    ) -> Result<Verdict, HandlerError> {
        let player = self
            .player(origin)
            .ok_or(HandlerError::UnknownConnection(origin))?;

        if player.state().has_joined() {
            debug!(conn = %origin, alias = player.alias(), "denied: already joined");
            return Ok(Err(Denial::AlreadyJoined));
        }
        if self.is_full() {
            return Ok(Err(Denial::Full));
        }
        if let Some(expected) = &self.config.password {
            if password != Some(expected.as_str()) {
                return Ok(Err(Denial::InvalidPassword));
            }
        }
        if alias.is_empty() {
            return Ok(Err(Denial::AliasEmpty));
        }
        if self.players.iter().any(|p| p.alias() == Some(alias)) {
            return Ok(Err(Denial::AliasInUse));
        }
        Ok(Ok(()))
    }

    /// Handles `ACK()` from `origin`. Only a `JOINED` player may ack, once.
    ///
    /// # Errors
    /// [`HandlerError::UnknownConnection`] if no player owns `origin`.
    pub fn ack(&mut self, origin: ConnectionId) -> Result<Verdict, HandlerError> {
        let player = self.player_mut(origin)?;
        let verdict = if player.state() == PlayerState::Joined {
            player.mark_acked();
            debug!(conn = %origin, alias = player.alias(), "accepted ack");
            Ok(())
        } else {
            debug!(conn = %origin, state = %player.state(), "denied ack");
            Err(Denial::Deny)
        };
        self.answer(origin, verdict)?;
        Ok(verdict)
    }

    /// Tells `origin` about a denial. Successes are silent.
    fn answer(&mut self, origin: ConnectionId, verdict: Verdict) -> Result<(), HandlerError> {
        if let Err(denial) = verdict {
            debug!(conn = %origin, %denial, "denied");
            self.player_mut(origin)?
                .send(LobbyClientOp::Error, vec![denial.code().into()]);
        }
        Ok(())
    }

    /// Closes the join window once enough players joined: kicks everyone
    /// who has not, trims the roster, and broadcasts `READY`.
    fn close_joins(&mut self) {
        if self.state != LobbyState::WaitingJoin || !self.is_full() {
            return;
        }
        info!(players = self.joined(), "all players have joined, waiting for clients to ack");

        for player in &mut self.players {
            if player.state() == PlayerState::NotJoined {
                debug!(conn = %player.id(), "kicking");
                player.kick(LobbyClientOp::Kick, vec![KICK_GAME_STARTING.into()]);
            }
        }
        self.players.retain(|p| p.state().has_joined());
        self.state = LobbyState::WaitingAck;
        self.broadcast(LobbyClientOp::Ready, Vec::new());
    }

    fn all_acked(&self) -> bool {
        self.state == LobbyState::WaitingAck && self.count(PlayerState::Ack) >= self.config.n_players
    }
}

fn op_join(lobby: &mut LobbyContext, origin: ConnectionId, args: Args<'_>) -> Result<(), HandlerError> {
    args.expect_len(2)?;
    let alias = args.str(0, "alias")?;
    let password = args.opt_str(1, "password")?;
    lobby.join(origin, alias, password).map(drop)
}

fn op_ack(lobby: &mut LobbyContext, origin: ConnectionId, args: Args<'_>) -> Result<(), HandlerError> {
    args.expect_len(0)?;
    lobby.ack(origin).map(drop)
}

/// The first phase of every session.
pub struct LobbyPhase {
    ctx: LobbyContext,
    ops: OpTable<LobbyContext>,
}

impl LobbyPhase {
    pub fn new(config: LobbyConfig) -> Self {
        info!(n_players = config.n_players, password = config.password.is_some(), "initing lobby");

        let mut ops = OpTable::new();
        for op in LobbyServerOp::ALL {
            let opcode = match op {
                LobbyServerOp::Join => ops.register(op.name(), op_join),
                LobbyServerOp::Ack => ops.register(op.name(), op_ack),
            };
            debug_assert_eq!(opcode, op.opcode());
        }

        info!("waiting for players to join");
        Self {
            ctx: LobbyContext::new(config),
            ops,
        }
    }

    pub fn context(&self) -> &LobbyContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut LobbyContext {
        &mut self.ctx
    }
}

impl Phase for LobbyPhase {
    fn name(&self) -> &'static str {
        "lobby"
    }

    fn op_name(&self, opcode: Opcode) -> Option<&'static str> {
        self.ops.name(opcode)
    }

    fn handle(&mut self, opcode: Opcode, origin: ConnectionId, args: &[Value]) -> Result<(), HandlerError> {
        self.ops.dispatch(&mut self.ctx, opcode, origin, args)
    }

    fn has_catch(&self) -> bool {
        true
    }

    /// Client mistakes (unknown opcode, bad arguments, undecodable
    /// payload) are answered `ERROR(DENY)` and forgotten. Anything else is
    /// left to be fatal.
    fn on_error(
        &mut self,
        error: &HandlerError,
        origin: ConnectionId,
        _args: &[Value],
    ) -> Result<Recovery, HandlerError> {
        if !error.is_client_fault() {
            return Ok(Recovery::Unrecovered);
        }
        self.ctx.answer(origin, Err(Denial::Deny))?;
        Ok(Recovery::Recovered)
    }

    fn on_tick(&mut self) -> Option<Box<dyn Phase>> {
        // Players may ack before READY, so a freshly closed lobby can
        // already be complete.
        self.ctx.close_joins();
        if !self.ctx.all_acked() {
            return None;
        }
        debug!("all clients ack");
        let players = std::mem::take(&mut self.ctx.players);
        Some(Box::new(GamePhase::from_lobby(players)))
    }

    fn accept(&mut self, conn: Connection) {
        let (id, peer) = (conn.id(), conn.peer());
        debug!(conn = %id, %peer, "requested connect");
        match self.ctx.admit(conn) {
            Ok(()) => debug!(conn = %id, players = self.ctx.players.len(), "accepted"),
            Err(denial) => debug!(conn = %id, state = %self.ctx.state, %denial, "denied"),
        }
    }

    fn connections(&self) -> Vec<&Connection> {
        self.ctx.players.iter().map(Player::connection).collect()
    }

    fn connections_mut(&mut self) -> Vec<&mut Connection> {
        self.ctx.players.iter_mut().map(Player::connection_mut).collect()
    }
}
