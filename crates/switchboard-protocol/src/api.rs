//! Opcode and error-code namespaces of the session API.
//!
//! Each namespace is a fixed enum whose discriminants are the wire values,
//! assigned in declaration order starting at 0. "Client" namespaces are
//! what the server sends to clients; "server" namespaces are what clients
//! send to the server and what the phase opcode tables register.

use std::fmt;

use crate::{Opcode, Value};

macro_rules! namespace {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member, in wire order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire value.
            pub fn opcode(self) -> Opcode {
                Opcode(self as u32)
            }

            /// The display name used in logs.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Resolves a wire value back to a member.
            pub fn from_opcode(opcode: Opcode) -> Option<Self> {
                Self::ALL.get(opcode.index()).copied()
            }
        }

        impl From<$name> for Opcode {
            fn from(value: $name) -> Self {
                value.opcode()
            }
        }

        impl From<$name> for Value {
            fn from(value: $name) -> Self {
                Value::from(value.opcode())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

namespace! {
    /// Lobby → client notifications.
    pub enum LobbyClientOp {
        /// `ERROR(code)`: a request was denied; `code` is a [`LobbyErrorCode`].
        Error => "ERROR",
        /// `KICK(reason)`: the connection is about to be closed.
        Kick => "KICK",
        /// `JOINED(alias, roster)`: `alias` joined; `roster` lists every
        /// joined alias in join order.
        Joined => "JOINED",
        /// `READY()`: the lobby is full; acknowledge to start.
        Ready => "READY",
    }
}

namespace! {
    /// Error codes carried by [`LobbyClientOp::Error`].
    pub enum LobbyErrorCode {
        Deny => "DENY",
        Full => "FULL",
        AlreadyJoined => "ALREADY_JOINED",
        InvalidPassword => "INVALID_PASSWORD",
        AliasEmpty => "ALIAS_EMPTY",
        AliasInUse => "ALIAS_IN_USE",
    }
}

namespace! {
    /// Client → lobby requests.
    pub enum LobbyServerOp {
        /// `JOIN(alias, password)`.
        Join => "JOIN",
        /// `ACK()`.
        Ack => "ACK",
    }
}

namespace! {
    /// Game → client notifications.
    pub enum GameClientOp {
        /// `START()`: the game phase is running.
        Start => "START",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_follow_declaration_order() {
        assert_eq!(LobbyClientOp::Error.opcode(), Opcode(0));
        assert_eq!(LobbyClientOp::Ready.opcode(), Opcode(3));
        assert_eq!(LobbyErrorCode::Deny.opcode(), Opcode(0));
        assert_eq!(LobbyErrorCode::AliasInUse.opcode(), Opcode(5));
        assert_eq!(LobbyServerOp::Join.opcode(), Opcode(0));
        assert_eq!(LobbyServerOp::Ack.opcode(), Opcode(1));
        assert_eq!(GameClientOp::Start.opcode(), Opcode(0));
    }

    #[test]
    fn test_from_opcode_round_trips_and_rejects_unknown() {
        for op in LobbyErrorCode::ALL {
            assert_eq!(LobbyErrorCode::from_opcode(op.opcode()), Some(*op));
        }
        assert_eq!(LobbyServerOp::from_opcode(Opcode(2)), None);
        assert_eq!(LobbyServerOp::from_opcode(Opcode::INVALID), None);
    }

    #[test]
    fn test_names_match_wire_spelling() {
        assert_eq!(LobbyErrorCode::InvalidPassword.to_string(), "INVALID_PASSWORD");
        assert_eq!(LobbyServerOp::Join.name(), "JOIN");
    }

    #[test]
    fn test_code_as_value_is_int() {
        assert_eq!(Value::from(LobbyErrorCode::Full), Value::Int(1));
    }
}
