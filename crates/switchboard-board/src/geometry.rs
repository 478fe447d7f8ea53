//! Points, ports, and rotations.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::BoardError;

/// Card width in board units, unrotated.
pub const WIDTH: i32 = 6;
/// Card height in board units, unrotated.
pub const HEIGHT: i32 = 4;

/// A board coordinate. `y` grows upward: a card's bottom edge has a
/// smaller `y` than its top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Set of open ports on a card, one bit per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u8);

impl Port {
    pub const NONE: Port = Port(0);
    pub const TOP: Port = Port(1 << 0);
    pub const RIGHT: Port = Port(1 << 1);
    pub const BOTTOM: Port = Port(1 << 2);
    pub const LEFT: Port = Port(1 << 3);
    pub const ALL: Port = Port(0b1111);

    /// Sides in the order the port tables are laid out.
    pub const SIDES: [Port; 4] = [Port::TOP, Port::RIGHT, Port::BOTTOM, Port::LEFT];

    /// Builds a mask from raw bits. Bits above the four sides are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Port(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every side in `other` is open here.
    pub const fn contains(self, other: Port) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Port {
    type Output = Port;

    fn bitor(self, rhs: Port) -> Port {
        Port(self.0 | rhs.0)
    }
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Rotation {
    type Error = BoardError;

    fn try_from(quarter_turns: u8) -> Result<Self, Self::Error> {
        match quarter_turns {
            0 => Ok(Self::R0),
            1 => Ok(Self::R90),
            2 => Ok(Self::R180),
            3 => Ok(Self::R270),
            other => Err(BoardError::InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u8 {
    fn from(rotation: Rotation) -> u8 {
        rotation as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_add() {
        assert_eq!(Point::new(1, -2) + Point::new(3, 4), Point::new(4, 2));
    }

    #[test]
    fn test_port_mask() {
        let ports = Port::RIGHT | Port::LEFT;
        assert!(ports.contains(Port::RIGHT));
        assert!(!ports.contains(Port::TOP));
        assert_eq!(Port::from_bits(0xff), Port::ALL);
        assert_eq!(Port::from_bits(15), Port::ALL);
    }

    #[test]
    fn test_rotation_from_quarter_turns() {
        assert_eq!(Rotation::try_from(3).unwrap(), Rotation::R270);
        assert!(matches!(Rotation::try_from(4), Err(BoardError::InvalidRotation(4))));
    }

    #[test]
    fn test_rotation_serializes_as_quarter_turns() {
        assert_eq!(serde_json::to_string(&Rotation::R90).unwrap(), "1");
        assert!(serde_json::from_str::<Rotation>("7").is_err());
    }
}
