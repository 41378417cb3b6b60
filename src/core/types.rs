//! Core data types shared across navigation, motion and the mission loop.
//!
//! - [`GridPosition`]: integer waypoint on the unit grid
//! - [`Heading`]: cardinal orientation, cyclic modulo 4
//! - [`TurnPlan`]: rotation needed to go from one heading to another

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer waypoint on the implicit unit grid.
///
/// Deserializes from a two element array (`[x, y]`) so routes read naturally
/// in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Delta `(dx, dy)` from `self` to `other`
    pub fn delta_to(&self, other: &GridPosition) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Position one cell ahead when facing `heading`
    pub fn step(&self, heading: Heading) -> GridPosition {
        let (dx, dy) = heading.unit_delta();
        GridPosition::new(self.x + dx, self.y + dy)
    }
}

impl From<[i32; 2]> for GridPosition {
    fn from(v: [i32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<GridPosition> for [i32; 2] {
    fn from(p: GridPosition) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal heading.
///
/// East -> North -> West -> South -> East is the positive (left turn)
/// rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Heading {
    /// All headings in index order
    pub const ALL: [Heading; 4] = [Heading::East, Heading::North, Heading::West, Heading::South];

    /// Heading for an arbitrary integer, taken modulo 4
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Heading after a 90° left turn
    pub fn left(self) -> Self {
        Self::from_index(self.index() as i64 + 1)
    }

    /// Heading after a 90° right turn
    pub fn right(self) -> Self {
        Self::from_index(self.index() as i64 + 3)
    }

    /// Unit grid delta of one forward cell
    pub fn unit_delta(self) -> (i32, i32) {
        match self {
            Heading::East => (1, 0),
            Heading::North => (0, 1),
            Heading::West => (-1, 0),
            Heading::South => (0, -1),
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Heading::East => "east",
            Heading::North => "north",
            Heading::West => "west",
            Heading::South => "south",
        };
        f.write_str(name)
    }
}

/// Rotation required to reach a target heading.
///
/// A half turn is always executed as two consecutive 90° left turns; the
/// platform has no reliable single 180° primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPlan {
    NoTurn,
    TurnLeft90,
    TurnRight90,
    Turn180AsTwoLefts,
}

impl TurnPlan {
    /// Heading reached by applying this plan to `from`
    pub fn apply(self, from: Heading) -> Heading {
        match self {
            TurnPlan::NoTurn => from,
            TurnPlan::TurnLeft90 => from.left(),
            TurnPlan::TurnRight90 => from.right(),
            TurnPlan::Turn180AsTwoLefts => from.left().left(),
        }
    }
}

/// Side of the chassis a steered arc or motor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}
