//! Dispatch engine for Switchboard.
//!
//! - [`OpTable`] maps opcodes to named handlers over a phase context.
//! - [`Phase`] is one swappable stage of a session: context, table, state
//!   check, and catch hook.
//! - [`Engine`] queues inbound messages and executes them in order against
//!   the active phase, applying the catch policy on failure.
//! - [`wait`] is the readiness multiplexer the event loop blocks on.

mod args;
mod connection;
mod engine;
mod error;
mod ops;
mod phase;
mod poll;

pub use args::Args;
pub use connection::Connection;
pub use engine::Engine;
pub use error::{EngineError, HandlerError};
pub use ops::{Handler, OpTable, Operation};
pub use phase::{Phase, Recovery};
pub use poll::{Readiness, wait};
