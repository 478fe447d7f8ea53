//! Policy denials.
//!
//! A denial is an expected, client-triggered refusal. It is answered with
//! an `ERROR` message to the offending client and never reaches the
//! engine's catch hook.

use switchboard_protocol::LobbyErrorCode;

/// Why a lobby request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    /// Generic refusal, e.g. an `ACK` from a player that is not `JOINED`.
    #[error("request not allowed in the current state")]
    Deny,

    /// No free slot.
    #[error("lobby is full")]
    Full,

    #[error("already joined")]
    AlreadyJoined,

    #[error("invalid password")]
    InvalidPassword,

    #[error("alias is empty")]
    AliasEmpty,

    #[error("alias already in use")]
    AliasInUse,
}

impl Denial {
    /// The error code sent to the client.
    pub fn code(self) -> LobbyErrorCode {
        match self {
            Self::Deny => LobbyErrorCode::Deny,
            Self::Full => LobbyErrorCode::Full,
            Self::AlreadyJoined => LobbyErrorCode::AlreadyJoined,
            Self::InvalidPassword => LobbyErrorCode::InvalidPassword,
            Self::AliasEmpty => LobbyErrorCode::AliasEmpty,
            Self::AliasInUse => LobbyErrorCode::AliasInUse,
        }
    }
}

/// Result of a lobby request that reached a decision.
pub type Verdict = Result<(), Denial>;
