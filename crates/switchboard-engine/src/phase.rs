//! The `Phase` trait: one swappable stage of a session.
//!
//! A phase bundles everything that changes together when the session
//! moves on: its context (players, state), its opcode table, its per-tick
//! state check, and its failure-recovery hook. The [`Engine`](crate::Engine)
//! holds exactly one active phase and replaces it as a whole.

use switchboard_protocol::{Opcode, Value};
use switchboard_transport::ConnectionId;

use crate::{Connection, HandlerError};

/// Outcome of a catch hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The failure was dealt with; processing continues.
    Recovered,
    /// The hook looked at the failure and declined it.
    Unrecovered,
}

/// A stage of the session (lobby, game, ...).
pub trait Phase: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Display name of a registered opcode.
    fn op_name(&self, opcode: Opcode) -> Option<&'static str>;

    /// Runs the handler registered for `opcode`.
    fn handle(
        &mut self,
        opcode: Opcode,
        origin: ConnectionId,
        args: &[Value],
    ) -> Result<(), HandlerError>;

    /// Whether this phase installs a catch hook at all.
    ///
    /// Without one, every handler failure is fatal.
    fn has_catch(&self) -> bool {
        false
    }

    /// The catch hook: offered every handler failure.
    ///
    /// Returning an error here is always fatal; there is no second round
    /// of recovery.
    fn on_error(
        &mut self,
        _error: &HandlerError,
        _origin: ConnectionId,
        _args: &[Value],
    ) -> Result<Recovery, HandlerError> {
        Ok(Recovery::Unrecovered)
    }

    /// The state check, run once after each queue drain.
    ///
    /// Returning a phase replaces this one; the old phase is dropped.
    fn on_tick(&mut self) -> Option<Box<dyn Phase>>;

    /// Takes ownership of a newly accepted connection. The phase either
    /// keeps it (and it becomes part of the polled set) or answers and
    /// drops it.
    fn accept(&mut self, conn: Connection);

    /// Every connection this phase owns, in roster order.
    fn connections(&self) -> Vec<&Connection>;

    /// Mutable access to the same connections, same order.
    fn connections_mut(&mut self) -> Vec<&mut Connection>;
}
