//! Declarative level schema.
//!
//! A [`LevelConfig`] is authored outside the engine (the level editor, or a JSON
//! file) and is read-only for the whole attempt. Field names serialize in
//! camelCase so level files written by the editor load unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LevelError;
use crate::grid::Position;
use crate::robot::{Color, Routine};

/// Board size used when a level does not specify one.
pub const DEFAULT_GRID_SIZE: i32 = 5;

fn default_grid_size() -> i32 {
    DEFAULT_GRID_SIZE
}

/// A key the robot picks up by standing on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyItem {
    /// Color token shared with the door(s) it opens.
    pub id: String,
    pub position: Position,
}

/// A door that blocks movement until the key with the same id is collected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorItem {
    pub id: String,
    pub position: Position,
}

/// A painted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoredCell {
    pub position: Position,
    pub color: Color,
}

/// Per-routine command budgets. A missing entry means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionLimits {
    #[serde(rename = "F0", default, skip_serializing_if = "Option::is_none")]
    pub f0: Option<u32>,
    #[serde(rename = "F1", default, skip_serializing_if = "Option::is_none")]
    pub f1: Option<u32>,
    #[serde(rename = "F2", default, skip_serializing_if = "Option::is_none")]
    pub f2: Option<u32>,
}

impl FunctionLimits {
    pub fn get(&self, routine: Routine) -> Option<u32> {
        match routine {
            Routine::F0 => self.f0,
            Routine::F1 => self.f1,
            Routine::F2 => self.f2,
        }
    }

    pub fn set(&mut self, routine: Routine, limit: Option<u32>) {
        match routine {
            Routine::F0 => self.f0 = limit,
            Routine::F1 => self.f1 = limit,
            Routine::F2 => self.f2 = limit,
        }
    }
}

/// The complete static description of one puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    /// Start cell. The robot always starts facing East.
    pub robot_start: Position,
    /// Goals ("stars"). All of them must be visited to win.
    #[serde(default)]
    pub star_positions: Vec<Position>,
    /// Walls.
    #[serde(default)]
    pub obstacles: Vec<Position>,
    #[serde(default)]
    pub keys: Vec<KeyItem>,
    #[serde(default)]
    pub doors: Vec<DoorItem>,
    /// Paint present when the level loads.
    #[serde(default)]
    pub colored_cells: Vec<ColoredCell>,
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,
    /// Maximum length of the main command queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_commands: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_limits: Option<FunctionLimits>,
    /// Seconds allowed for the attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl LevelConfig {
    /// An empty 5x5 level with the robot on `robot_start`.
    pub fn new(id: u32, name: impl Into<String>, robot_start: Position) -> Self {
        Self {
            id,
            name: name.into(),
            robot_start,
            star_positions: Vec::new(),
            obstacles: Vec::new(),
            keys: Vec::new(),
            doors: Vec::new(),
            colored_cells: Vec::new(),
            grid_size: DEFAULT_GRID_SIZE,
            max_commands: None,
            function_limits: None,
            time_limit: None,
        }
    }

    pub fn with_grid_size(mut self, grid_size: i32) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_star(mut self, position: Position) -> Self {
        self.add_star(position);
        self
    }

    pub fn with_obstacle(mut self, position: Position) -> Self {
        self.add_obstacle(position);
        self
    }

    pub fn with_key(mut self, id: impl Into<String>, position: Position) -> Self {
        self.keys.push(KeyItem {
            id: id.into(),
            position,
        });
        self
    }

    pub fn with_door(mut self, id: impl Into<String>, position: Position) -> Self {
        self.doors.push(DoorItem {
            id: id.into(),
            position,
        });
        self
    }

    pub fn with_paint(mut self, position: Position, color: Color) -> Self {
        self.paint(position, color);
        self
    }

    pub fn with_max_commands(mut self, limit: u32) -> Self {
        self.max_commands = Some(limit);
        self
    }

    pub fn with_function_limit(mut self, routine: Routine, limit: u32) -> Self {
        self.function_limits
            .get_or_insert_with(FunctionLimits::default)
            .set(routine, Some(limit));
        self
    }

    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn add_star(&mut self, position: Position) {
        if !self.star_positions.contains(&position) {
            self.star_positions.push(position);
        }
    }

    pub fn add_obstacle(&mut self, position: Position) {
        if !self.obstacles.contains(&position) {
            self.obstacles.push(position);
        }
    }

    /// Sets the initial paint of a cell, replacing any previous color.
    pub fn paint(&mut self, position: Position, color: Color) {
        match self.colored_cells.iter_mut().find(|c| c.position == position) {
            Some(cell) => cell.color = color,
            None => self.colored_cells.push(ColoredCell { position, color }),
        }
    }

    /// The paint map a run starts from. Later entries overwrite earlier ones.
    pub fn initial_paint(&self) -> HashMap<Position, Color> {
        self.colored_cells
            .iter()
            .map(|c| (c.position, c.color))
            .collect()
    }

    pub fn routine_limit(&self, routine: Routine) -> Option<u32> {
        self.function_limits.and_then(|l| l.get(routine))
    }

    /// Checks the rules the level editor enforces.
    pub fn validate(&self) -> Result<(), LevelError> {
        let level = self.id;
        let grid_size = self.grid_size;
        if grid_size < 1 {
            return Err(LevelError::InvalidGridSize { level, grid_size });
        }

        let placed = std::iter::once(("robot start", self.robot_start))
            .chain(self.star_positions.iter().map(|&p| ("star", p)))
            .chain(self.obstacles.iter().map(|&p| ("wall", p)))
            .chain(self.keys.iter().map(|k| ("key", k.position)))
            .chain(self.doors.iter().map(|d| ("door", d.position)))
            .chain(self.colored_cells.iter().map(|c| ("painted cell", c.position)));

        for (what, position) in placed {
            if !position.in_bounds(grid_size) {
                return Err(LevelError::OutOfBounds {
                    level,
                    what,
                    position,
                    grid_size,
                });
            }
            if what != "wall" && self.obstacles.contains(&position) {
                return Err(LevelError::OnWall {
                    level,
                    what,
                    position,
                });
            }
        }

        if let Some(&position) = self
            .star_positions
            .iter()
            .find(|&&p| !is_valid_star_position(p, self.robot_start))
        {
            return Err(LevelError::StarOnStart { level, position });
        }

        if self.max_commands == Some(0) {
            return Err(LevelError::EmptyBudget {
                level,
                what: "command",
            });
        }
        for routine in Routine::ALL {
            if self.routine_limit(routine) == Some(0) {
                return Err(LevelError::EmptyBudget {
                    level,
                    what: routine.token(),
                });
            }
        }

        Ok(())
    }
}

/// Whether a star may be placed at `star` given the robot start.
pub fn is_valid_star_position(star: Position, robot_start: Position) -> bool {
    star != robot_start
}
