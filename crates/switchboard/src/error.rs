//! Unified error type for the server.

use switchboard_engine::EngineError;
use switchboard_transport::TransportError;

/// Anything that stops the server.
///
/// Each layer keeps its own error enum; `#[from]` lets `?` lift them
/// here.
#[derive(Debug, thiserror::Error)]
pub enum SwitchboardError {
    /// Binding or accepting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A handler failure the active phase did not recover from.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The configuration cannot describe a playable session.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use switchboard_engine::HandlerError;
    use switchboard_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: SwitchboardError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, SwitchboardError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_engine_error() {
        let err: SwitchboardError = EngineError::Unrecovered {
            phase: "game",
            op: "INVALID(#0)".into(),
            origin: ConnectionId::new(1),
            source: HandlerError::UnknownOpcode(switchboard_protocol::Opcode(0)),
        }
        .into();
        assert!(matches!(err, SwitchboardError::Engine(_)));
        assert!(err.to_string().contains("game"));
    }
}
