//! Wire protocol for Switchboard.
//!
//! This crate defines what travels between client and server:
//!
//! - **Types** ([`Opcode`], [`Value`], [`Message`]): a message is an
//!   opcode followed by ordered argument values.
//! - **Codec** ([`Codec`] trait, [`MsgpackCodec`], [`JsonCodec`]): how a
//!   message becomes a payload. MessagePack is the default.
//! - **Framing** ([`Messenger`]): how payloads are delimited on a byte
//!   stream: a 4-byte big-endian length prefix, with a cap on what a
//!   peer may declare.
//! - **Namespaces** ([`LobbyClientOp`], [`LobbyErrorCode`],
//!   [`LobbyServerOp`], [`GameClientOp`]): the fixed opcode tables.
//!
//! ```text
//! Transport (bytes) → Messenger (frames) → Codec (Message) → Engine
//! ```

mod api;
mod codec;
mod error;
mod messenger;
mod types;

pub use api::{GameClientOp, LobbyClientOp, LobbyErrorCode, LobbyServerOp};
pub use codec::{Codec, JsonCodec, MsgpackCodec};
pub use error::{CodecError, MessengerError, ProtocolError};
pub use messenger::{DEFAULT_MAX_FRAME, HEADER_LEN, Messenger, encode_frame};
pub use types::{Message, Opcode, Value};
