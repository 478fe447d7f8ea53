//! Error types for the protocol layer.
//!
//! Framing and decoding failures live here; socket failures stay in
//! [`TransportError`](switchboard_transport::TransportError). The
//! [`MessengerError`] wrapper lets a single `receive()` call report
//! either without the caller guessing which layer failed.

use switchboard_transport::TransportError;

/// Error raised by whichever serde backend a [`Codec`](crate::Codec) wraps.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[error("encode failed: {0}")]
    Encode(CodecError),

    /// A well-framed payload could not be decoded.
    ///
    /// This is the malformed-message condition: the framing was intact
    /// (the declared number of bytes arrived) but the bytes are not a
    /// valid `[opcode, args...]` sequence.
    #[error("malformed message: {0}")]
    Decode(CodecError),

    /// A frame is larger than the messenger accepts, or than the 4-byte
    /// length header can describe.
    #[error("payload of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),
}

/// Errors reported by a [`Messenger`](crate::Messenger).
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// A frame was rejected: its payload was undecodable or it was too
    /// large to buffer. The messenger stays aligned on frame boundaries.
    #[error(transparent)]
    Malformed(#[from] ProtocolError),

    /// The underlying socket failed or was closed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl MessengerError {
    /// Returns `true` for rejected frames on an otherwise healthy stream.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Returns `true` when the peer finished sending (end-of-file).
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Transport(TransportError::ConnectionClosed(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_the_condition() {
        let inner = serde_json::from_slice::<u32>(b"{").unwrap_err();
        let err = ProtocolError::Decode(inner.into());
        assert!(err.to_string().starts_with("malformed message"));
    }

    #[test]
    fn test_messenger_error_classifies_layers() {
        let oversized: MessengerError = ProtocolError::FrameTooLarge(1 << 30).into();
        assert!(oversized.is_malformed());
        assert!(!oversized.is_eof());

        let closed: MessengerError = TransportError::ConnectionClosed("eof".into()).into();
        assert!(!closed.is_malformed());
        assert!(closed.is_eof());
        assert!(closed.to_string().contains("eof"));
    }
}
