//! Grid coordinates and the pure movement helpers the interpreter is built on.
//!
//! Everything here is side-effect free. Inputs are assumed to have been validated
//! by [`LevelConfig::validate`](crate::level::LevelConfig::validate).

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::robot::Facing;

/// A cell on the square board. `(0, 0)` is the top-left corner; `y` grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Builds a position from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The same cell as a `glam` vector.
    pub fn as_ivec2(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    /// Whether the cell lies on a `grid_size` × `grid_size` board.
    pub fn in_bounds(self, grid_size: i32) -> bool {
        (0..grid_size).contains(&self.x) && (0..grid_size).contains(&self.y)
    }
}

impl From<IVec2> for Position {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Formats as `"x,y"`, the key hosts use when persisting collected goals.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Reduces any degree value into `[0, 360)`.
pub fn normalize_rotation(rotation: i32) -> i32 {
    rotation.rem_euclid(360)
}

/// Returns the cell one step ahead of `current` for the given heading.
///
/// The result is clamped to the board: stepping off an edge yields the same edge
/// coordinate. Rotations that are not a multiple of 90 degrees leave `current`
/// unchanged.
pub fn calculate_next_position(current: Position, rotation: i32, grid_size: i32) -> Position {
    let Some(facing) = Facing::from_rotation(rotation) else {
        return current;
    };
    let max = IVec2::splat((grid_size - 1).max(0));
    (current.as_ivec2() + facing.delta()).clamp(IVec2::ZERO, max).into()
}

/// Exact membership test against the obstacle list.
pub fn check_collision(position: Position, obstacles: &[Position]) -> bool {
    obstacles.contains(&position)
}

/// Exact coordinate equality.
pub fn check_win(robot: Position, target: Position) -> bool {
    robot == target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_negative_values() {
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-720), 0);
    }

    #[test]
    fn north_decreases_y() {
        let next = calculate_next_position(Position::new(2, 2), 0, 5);
        assert_eq!(next, Position::new(2, 1));
    }

    #[test]
    fn west_at_origin_is_clamped() {
        let next = calculate_next_position(Position::new(0, 0), 270, 5);
        assert_eq!(next, Position::new(0, 0));
    }

    #[test]
    fn south_east_corner_is_clamped() {
        let corner = Position::new(4, 4);
        assert_eq!(calculate_next_position(corner, 90, 5), corner);
        assert_eq!(calculate_next_position(corner, 180, 5), corner);
    }

    #[test]
    fn off_axis_rotation_does_not_move() {
        let here = Position::new(1, 1);
        assert_eq!(calculate_next_position(here, 45, 5), here);
    }

    #[test]
    fn display_matches_goal_key_format() {
        assert_eq!(Position::new(3, 7).to_string(), "3,7");
    }
}
