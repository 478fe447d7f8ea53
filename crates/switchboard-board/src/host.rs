//! Placed cards and pairwise connectivity.

use serde::{Deserialize, Serialize};

use crate::{HEIGHT, Point, Port, Rotation, WIDTH};

/// Relationship between two placed cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    /// Not touching, or touching only at a corner.
    Disconnected,
    /// Edge-adjacent with an open port meeting an open port.
    Connected,
    /// Illegal placement: overlapping, or edge-adjacent without a
    /// matching pair of open ports.
    Error,
}

/// Axis-aligned extent of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hitbox {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Hitbox {
    /// Shares interior area with `other`.
    fn overlaps(&self, other: &Hitbox) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    /// `other` touches this box along an edge or at a corner (closed
    /// intervals).
    fn touches(&self, other: &Hitbox) -> bool {
        other.bottom <= self.top
            && other.left <= self.right
            && other.top >= self.bottom
            && other.right >= self.left
    }
}

/// Corners of a card as placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

// Offsets from the origin per rotation: [left, right, top, bottom].
const HITBOX: [[i32; 4]; 4] = [
    [0, WIDTH, 0, -HEIGHT],
    [-HEIGHT, 0, 0, -WIDTH],
    [-WIDTH, 0, HEIGHT, 0],
    [0, HEIGHT, WIDTH, 0],
];

const fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

// [top left, top right, bottom left, bottom right]
const CORNERS: [[Point; 4]; 4] = [
    [p(0, 0), p(WIDTH, 0), p(0, -HEIGHT), p(WIDTH, -HEIGHT)],
    [p(-HEIGHT, 0), p(0, 0), p(-HEIGHT, -WIDTH), p(0, -WIDTH)],
    [p(-WIDTH, HEIGHT), p(0, HEIGHT), p(-WIDTH, 0), p(0, 0)],
    [p(0, WIDTH), p(HEIGHT, WIDTH), p(0, 0), p(HEIGHT, 0)],
];

// Port midpoints in `Port::SIDES` order: [top, right, bottom, left].
const PORTS: [[Point; 4]; 4] = [
    [p(WIDTH / 2, 0), p(WIDTH, -HEIGHT / 2), p(WIDTH / 2, -HEIGHT), p(0, -HEIGHT / 2)],
    [p(-HEIGHT / 2, 0), p(0, -WIDTH / 2), p(-HEIGHT / 2, -WIDTH), p(-HEIGHT, -WIDTH / 2)],
    [p(-WIDTH / 2, HEIGHT), p(0, HEIGHT / 2), p(-WIDTH / 2, 0), p(-WIDTH, HEIGHT / 2)],
    [p(HEIGHT / 2, WIDTH), p(HEIGHT, WIDTH / 2), p(HEIGHT / 2, 0), p(0, WIDTH / 2)],
];

/// A card placed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    /// Anchor point the rotation tables are relative to.
    pub origin: Point,
    pub ports: Port,
    pub rotation: Rotation,
}

impl Host {
    pub fn new(name: impl Into<String>, origin: Point, ports: Port, rotation: Rotation) -> Self {
        Self {
            name: name.into(),
            origin,
            ports,
            rotation,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        let [left, right, top, bottom] = HITBOX[self.rotation.index()];
        Hitbox {
            left: self.origin.x + left,
            right: self.origin.x + right,
            top: self.origin.y + top,
            bottom: self.origin.y + bottom,
        }
    }

    pub fn corners(&self) -> Corners {
        let [tl, tr, bl, br] = CORNERS[self.rotation.index()];
        Corners {
            top_left: self.origin + tl,
            top_right: self.origin + tr,
            bottom_left: self.origin + bl,
            bottom_right: self.origin + br,
        }
    }

    /// Each port's position and whether it is open, in `Port::SIDES` order.
    pub fn portbox(&self) -> [(Point, bool); 4] {
        let offsets = PORTS[self.rotation.index()];
        std::array::from_fn(|i| (self.origin + offsets[i], self.ports.contains(Port::SIDES[i])))
    }

    /// Classifies how this card sits against `other`.
    pub fn check_connectivity(&self, other: &Host) -> Connectivity {
        let mine = self.hitbox();
        let theirs = other.hitbox();

        if mine == theirs || mine.overlaps(&theirs) {
            return Connectivity::Error;
        }
        if !mine.touches(&theirs) {
            return Connectivity::Disconnected;
        }

        let a = self.corners();
        let b = other.corners();
        if b.bottom_right == a.top_left
            || b.bottom_left == a.top_right
            || b.top_right == a.bottom_left
            || b.top_left == a.bottom_right
        {
            return Connectivity::Disconnected;
        }

        // Edge-adjacent: the first of our open ports that lands on one of
        // theirs decides.
        let theirs = other.portbox();
        for (point, open) in self.portbox() {
            if !open {
                continue;
            }
            if let Some((_, their_open)) = theirs.iter().find(|(q, _)| *q == point) {
                return if *their_open {
                    Connectivity::Connected
                } else {
                    Connectivity::Error
                };
            }
        }
        Connectivity::Error
    }
}
