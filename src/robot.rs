//! Robot pose and the command vocabulary the player queues.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseTokenError;
use crate::grid::{Position, normalize_rotation};

/// Every level starts with the robot facing East.
pub const START_ROTATION: i32 = 90;

/// The pose of the robot on the board.
///
/// `rotation` is kept in raw degrees (LEFT/RIGHT just add ∓90), and reduced with
/// [`normalize_rotation`] whenever a heading is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotState {
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            rotation: START_ROTATION,
        }
    }
}

impl RobotState {
    /// A robot standing on `position`, facing East.
    pub fn at(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
            rotation: START_ROTATION,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Position) {
        self.x = position.x;
        self.y = position.y;
    }

    /// The cardinal heading, or `None` if the rotation is not a right angle.
    pub fn facing(&self) -> Option<Facing> {
        Facing::from_rotation(self.rotation)
    }

    /// Turns 90 degrees counter-clockwise.
    ///
    /// The raw value is kept unless the subtraction would overflow, in which case
    /// the heading is reduced first.
    pub fn turn_left(&mut self) {
        self.rotation = self
            .rotation
            .checked_sub(90)
            .unwrap_or_else(|| normalize_rotation(self.rotation) - 90);
    }

    /// Turns 90 degrees clockwise. Overflow is handled like [`turn_left`](Self::turn_left).
    pub fn turn_right(&mut self) {
        self.rotation = self
            .rotation
            .checked_add(90)
            .unwrap_or_else(|| normalize_rotation(self.rotation) + 90);
    }
}

/// One of the four headings the robot can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    /// Maps a degree value onto a heading. 0 is North, 90 East, and so on.
    pub fn from_rotation(rotation: i32) -> Option<Self> {
        match normalize_rotation(rotation) {
            0 => Some(Self::North),
            90 => Some(Self::East),
            180 => Some(Self::South),
            270 => Some(Self::West),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::North => 0,
            Self::East => 90,
            Self::South => 180,
            Self::West => 270,
        }
    }

    /// Unit step on the board. North is `-y`.
    pub fn delta(self) -> IVec2 {
        match self {
            Self::North => IVec2::NEG_Y,
            Self::East => IVec2::X,
            Self::South => IVec2::Y,
            Self::West => IVec2::NEG_X,
        }
    }
}

/// The three sub-routine slots. This is a closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Routine {
    F0,
    F1,
    F2,
}

impl Routine {
    pub const ALL: [Routine; 3] = [Routine::F0, Routine::F1, Routine::F2];

    pub fn token(self) -> &'static str {
        match self {
            Self::F0 => "F0",
            Self::F1 => "F1",
            Self::F2 => "F2",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Routine {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F0" => Ok(Self::F0),
            "F1" => Ok(Self::F1),
            "F2" => Ok(Self::F2),
            _ => Err(ParseTokenError::UnknownRoutine(s.to_string())),
        }
    }
}

/// Paint colors. Keys and doors use the same tokens as their ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Pink,
    Cyan,
}

/// Swatch used for key/door ids outside the palette.
pub const FALLBACK_SWATCH: &str = "#fbbf24";

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
        Color::Pink,
        Color::Cyan,
    ];

    /// Lower-case token, as used in level files and key/door ids.
    pub fn token(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Cyan => "cyan",
        }
    }

    /// Hex swatch for rendering.
    pub fn swatch(self) -> &'static str {
        match self {
            Self::Red => "#ef4444",
            Self::Blue => "#3b82f6",
            Self::Green => "#10b981",
            Self::Yellow => "#f59e0b",
            Self::Purple => "#a855f7",
            Self::Orange => "#f97316",
            Self::Pink => "#ec4899",
            Self::Cyan => "#06b6d4",
        }
    }

    /// Swatch for an arbitrary key/door id.
    pub fn swatch_for_id(id: &str) -> &'static str {
        id.parse::<Color>()
            .map(Color::swatch)
            .unwrap_or(FALLBACK_SWATCH)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Color {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseTokenError::UnknownColor(s.to_string()))
    }
}

/// A single queued instruction.
///
/// Serialized as its upper-case token (`"MOVE"`, `"F1"`, `"PAINT_RED"`, `"IF_BLUE"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Command {
    /// Step one cell forward.
    Move,
    /// Turn 90 degrees counter-clockwise.
    Left,
    /// Turn 90 degrees clockwise.
    Right,
    /// Inline the body of a sub-routine.
    Call(Routine),
    /// Color the cell under the robot.
    Paint(Color),
    /// Skip the next instruction unless the cell under the robot has this color.
    If(Color),
}

impl Command {
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    /// Whether this instruction can change the robot's pose.
    pub fn is_motion(&self) -> bool {
        matches!(self, Self::Move | Self::Left | Self::Right)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => f.write_str("MOVE"),
            Self::Left => f.write_str("LEFT"),
            Self::Right => f.write_str("RIGHT"),
            Self::Call(r) => f.write_str(r.token()),
            Self::Paint(c) => write!(f, "PAINT_{}", c.token().to_ascii_uppercase()),
            Self::If(c) => write!(f, "IF_{}", c.token().to_ascii_uppercase()),
        }
    }
}

impl FromStr for Command {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOVE" => return Ok(Self::Move),
            "LEFT" => return Ok(Self::Left),
            "RIGHT" => return Ok(Self::Right),
            _ => {}
        }
        if let Ok(routine) = s.parse::<Routine>() {
            return Ok(Self::Call(routine));
        }
        if let Some(color) = s.strip_prefix("PAINT_") {
            return color.parse().map(Self::Paint);
        }
        if let Some(color) = s.strip_prefix("IF_") {
            return color.parse().map(Self::If);
        }
        Err(ParseTokenError::UnknownCommand(s.to_string()))
    }
}

impl TryFrom<String> for Command {
    type Error = ParseTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Command> for String {
    fn from(value: Command) -> Self {
        value.to_string()
    }
}

/// The body of one sub-routine slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: Routine,
    pub commands: Vec<Command>,
}

impl FunctionDefinition {
    pub fn new(name: Routine, commands: Vec<Command>) -> Self {
        Self { name, commands }
    }

    /// One empty definition per slot.
    pub fn empty_set() -> Vec<FunctionDefinition> {
        Routine::ALL
            .into_iter()
            .map(|name| Self::new(name, Vec::new()))
            .collect()
    }

    /// Whether the body calls its own slot directly.
    pub fn is_self_recursive(&self) -> bool {
        self.commands.contains(&Command::Call(self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_and_print() {
        for token in ["MOVE", "LEFT", "RIGHT", "F2", "PAINT_CYAN", "IF_RED"] {
            let cmd: Command = token.parse().unwrap();
            assert_eq!(cmd.to_string(), token);
        }
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert!("JUMP".parse::<Command>().is_err());
        assert!("PAINT_MAUVE".parse::<Command>().is_err());
        assert!("F3".parse::<Command>().is_err());
    }

    #[test]
    fn turning_keeps_raw_degrees() {
        let mut robot = RobotState::default();
        robot.turn_left();
        robot.turn_left();
        robot.turn_left();
        assert_eq!(robot.rotation, -180);
        assert_eq!(robot.facing(), Some(Facing::South));
    }

    #[test]
    fn turning_near_integer_limits_keeps_a_heading() {
        // 2_147_483_520 is the largest multiple of 360 an i32 can hold.
        let mut robot = RobotState {
            rotation: 2_147_483_520 + 90,
            ..RobotState::default()
        };
        robot.turn_right();
        assert_eq!(robot.rotation, 180);
        assert_eq!(robot.facing(), Some(Facing::South));

        robot.rotation = -2_147_483_520;
        robot.turn_left();
        assert_eq!(robot.facing(), Some(Facing::West));
        robot.turn_left();
        assert_eq!(robot.rotation, 180);
        assert_eq!(robot.facing(), Some(Facing::South));
    }

    #[test]
    fn unknown_key_id_uses_fallback_swatch() {
        assert_eq!(Color::swatch_for_id("blue"), "#3b82f6");
        assert_eq!(Color::swatch_for_id("gold"), FALLBACK_SWATCH);
    }
}
