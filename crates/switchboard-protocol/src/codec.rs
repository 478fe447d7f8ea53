//! Codec trait and implementations for serializing/deserializing payloads.
//!
//! The framing layer only moves opaque byte payloads; a [`Codec`] decides
//! what those bytes mean. Swapping the codec changes the payload encoding
//! without touching framing, dispatch, or the phases.
//!
//! [`MsgpackCodec`] is what clients speak. [`JsonCodec`] is kept for
//! debugging sessions by hand.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// MsgpackCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses MessagePack (via `rmp-serde`).
///
/// A message is a msgpack array whose first element is the opcode.
///
/// ## Example
///
/// ```rust
/// use switchboard_protocol::{Codec, Message, MsgpackCodec, Opcode};
///
/// let msg = Message::new(Opcode(0), vec!["solo".into(), "".into()]);
///
/// let bytes = MsgpackCodec.encode(&msg).unwrap();
/// assert_eq!(bytes, b"\x93\x00\xa4solo\xa0");
///
/// let decoded: Message = MsgpackCodec.decode(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackCodec;

impl Codec for MsgpackCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec(value).map_err(|e| ProtocolError::Encode(e.into()))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        rmp_serde::from_slice(data).map_err(|e| ProtocolError::Decode(e.into()))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use switchboard_protocol::{Codec, JsonCodec, Message, Opcode};
///
/// let msg = Message::new(Opcode(0), vec!["solo".into(), "".into()]);
/// assert_eq!(JsonCodec.encode(&msg).unwrap(), br#"[0,"solo",""]"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.into()))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.into()))
    }
}
