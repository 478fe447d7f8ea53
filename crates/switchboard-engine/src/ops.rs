//! Opcode tables: integer opcode → named handler.

use std::fmt;

use switchboard_protocol::{Opcode, Value};
use switchboard_transport::ConnectionId;

use crate::{Args, HandlerError};

/// A handler bound to an opcode.
///
/// Receives the phase context, the connection the message came from, and
/// the message's arguments.
pub type Handler<C> =
    Box<dyn Fn(&mut C, ConnectionId, Args<'_>) -> Result<(), HandlerError> + Send + Sync>;

/// One registered operation: a display name plus its handler.
pub struct Operation<C> {
    name: &'static str,
    handler: Handler<C>,
}

impl<C> Operation<C> {
    /// Display name used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An ordered table of operations over context `C`.
///
/// Opcodes are assigned sequentially by [`register`](Self::register), so a
/// phase that registers in the order of its namespace enum gets opcodes
/// equal to that enum's wire values.
pub struct OpTable<C> {
    ops: Vec<Operation<C>>,
}

impl<C> OpTable<C> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Binds `handler` to the next opcode and returns that opcode.
    pub fn register<F>(&mut self, name: &'static str, handler: F) -> Opcode
    where
        F: Fn(&mut C, ConnectionId, Args<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let opcode = Opcode(self.ops.len() as u32);
        self.ops.push(Operation {
            name,
            handler: Box::new(handler),
        });
        tracing::debug!(%opcode, op = name, "registered operation");
        opcode
    }

    /// Looks up an operation.
    pub fn get(&self, opcode: Opcode) -> Option<&Operation<C>> {
        self.ops.get(opcode.index())
    }

    /// Display name of `opcode`, if registered.
    pub fn name(&self, opcode: Opcode) -> Option<&'static str> {
        self.get(opcode).map(Operation::name)
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Invokes the handler for `opcode` against `context`.
    ///
    /// # Errors
    /// [`HandlerError::UnknownOpcode`] if nothing is registered under
    /// `opcode`; otherwise whatever the handler returns.
    pub fn dispatch(
        &self,
        context: &mut C,
        opcode: Opcode,
        origin: ConnectionId,
        args: &[Value],
    ) -> Result<(), HandlerError> {
        let op = self.get(opcode).ok_or(HandlerError::UnknownOpcode(opcode))?;
        (op.handler)(context, origin, Args::new(op.name, args))
    }
}

impl<C> Default for OpTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for OpTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ops.iter().map(|op| op.name)).finish()
    }
}
