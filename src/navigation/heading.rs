//! Heading and turn calculator.

use crate::core::types::{Heading, TurnPlan};
use crate::error::{Error, Result};

/// Heading required to move by `(dx, dy)`.
///
/// Only a single grid step along one axis is a valid move; anything else is
/// [`Error::InvalidMove`].
pub fn desired_heading(dx: i32, dy: i32) -> Result<Heading> {
    match (dx, dy) {
        (1, 0) => Ok(Heading::East),
        (0, 1) => Ok(Heading::North),
        (-1, 0) => Ok(Heading::West),
        (0, -1) => Ok(Heading::South),
        _ => Err(Error::InvalidMove { dx, dy }),
    }
}

/// Rotation from `current` to `target`, from `(target - current) mod 4`.
pub fn plan_turn(current: Heading, target: Heading) -> TurnPlan {
    let diff = (target.index() as i32 - current.index() as i32).rem_euclid(4);
    match diff {
        0 => TurnPlan::NoTurn,
        1 => TurnPlan::TurnLeft90,
        3 => TurnPlan::TurnRight90,
        _ => TurnPlan::Turn180AsTwoLefts,
    }
}
