//! Error types for dispatch.
//!
//! Two tiers: a [`HandlerError`] is what a single operation can fail with
//! and is offered to the active phase's catch hook. An [`EngineError`] is
//! what is left when recovery did not happen; it is fatal.

use switchboard_protocol::{Opcode, ProtocolError};
use switchboard_transport::{ConnectionId, TransportError};

/// Failure of one queued operation.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The opcode is not registered in the active phase's table.
    #[error("no operation registered for opcode {0}")]
    UnknownOpcode(Opcode),

    /// The arguments do not fit the operation's signature.
    #[error("bad arguments to {op}: {reason}")]
    Arguments {
        /// Display name of the operation.
        op: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// A complete frame arrived whose payload could not be decoded.
    #[error(transparent)]
    Malformed(#[from] ProtocolError),

    /// The message came from a connection the phase does not own.
    #[error("no player owns {0}")]
    UnknownConnection(ConnectionId),

    /// Talking to a peer failed in a way the handler could not ignore.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl HandlerError {
    /// Builds an [`HandlerError::Arguments`].
    pub fn arguments(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Arguments {
            op,
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures caused by what a client sent rather
    /// than by server state: unknown opcodes, bad arguments, and
    /// undecodable payloads.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::UnknownOpcode(_) | Self::Arguments { .. } | Self::Malformed(_)
        )
    }
}

/// A dispatch failure that was not recovered. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The handler failed and the phase either has no catch hook or its
    /// hook declined to recover.
    #[error("[{phase}] unrecovered failure in {op} from {origin}: {source}")]
    Unrecovered {
        phase: &'static str,
        op: String,
        origin: ConnectionId,
        #[source]
        source: HandlerError,
    },

    /// The catch hook itself failed while handling a handler failure.
    #[error("[{phase}] catch hook failed while recovering {op} from {origin} ({original}): {source}")]
    CatchFailed {
        phase: &'static str,
        op: String,
        origin: ConnectionId,
        original: HandlerError,
        #[source]
        source: HandlerError,
    },
}
