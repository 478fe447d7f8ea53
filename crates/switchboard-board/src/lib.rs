//! Card placement geometry for Switchboard's game phase.
//!
//! Cards are `WIDTH` × `HEIGHT` rectangles with up to four ports, one per
//! side, placed at an origin with a rotation. Two placed cards are either
//! disconnected, connected through a pair of open ports, or in an illegal
//! arrangement. Pure computation; nothing here touches the network.

mod board;
mod geometry;
mod host;

pub use board::Board;
pub use geometry::{HEIGHT, Point, Port, Rotation, WIDTH};
pub use host::{Connectivity, Corners, Hitbox, Host};

/// Errors from building or placing cards.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Rotations are 0 to 3 quarter turns.
    #[error("invalid rotation {0}, expected 0..=3")]
    InvalidRotation(u8),

    /// The card overlaps, or abuts without a matching open port pair.
    #[error("{host} cannot be placed against {against}")]
    IllegalPlacement { host: String, against: String },
}
