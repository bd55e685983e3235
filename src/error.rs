//! Error types.
//!
//! Expansion warnings and blocked moves are gameplay outcomes, not errors, and do
//! not appear here. See [`ExpansionWarning`](crate::expander::ExpansionWarning).

use thiserror::Error;

use crate::grid::Position;
use crate::robot::Routine;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Token(#[from] ParseTokenError),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A command, routine or color token that is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTokenError {
    #[error("unknown command token: {0}")]
    UnknownCommand(String),

    #[error("unknown routine token: {0}")]
    UnknownRoutine(String),

    #[error("unknown color token: {0}")]
    UnknownColor(String),
}

/// A level that breaks the authoring rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level {level}: grid size must be at least 1, got {grid_size}")]
    InvalidGridSize { level: u32, grid_size: i32 },

    #[error("level {level}: {what} at {position} is outside the {grid_size}x{grid_size} grid")]
    OutOfBounds {
        level: u32,
        what: &'static str,
        position: Position,
        grid_size: i32,
    },

    #[error("level {level}: star at {position} sits on the robot start")]
    StarOnStart { level: u32, position: Position },

    #[error("level {level}: {what} at {position} sits on a wall")]
    OnWall {
        level: u32,
        what: &'static str,
        position: Position,
    },

    #[error("level {level}: {what} budget must be at least 1")]
    EmptyBudget { level: u32, what: &'static str },
}

/// Failures while loading or addressing a list of levels.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed level data: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] LevelError),

    #[error("level list is empty")]
    Empty,

    #[error("duplicate level id {0}")]
    DuplicateId(u32),

    #[error("level {0} not found")]
    NotFound(u32),
}

/// Hard aborts of the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// `steps` is the length reached before expansion stopped, so it is a lower
    /// bound when the expansion was abandoned early.
    #[error("program expands past the limit of {limit} steps (reached {steps}); check for runaway recursion")]
    StepLimitExceeded { steps: usize, limit: usize },
}

/// Edits to the command queue or routine bodies that the level does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("cannot edit commands while the program is running")]
    Executing,

    #[error("command queue is full ({limit} commands)")]
    QueueFull { limit: u32 },

    #[error("{routine} is full ({limit} commands)")]
    RoutineFull { routine: Routine, limit: u32 },

    #[error("no command at index {0}")]
    NoSuchIndex(usize),
}

/// Session-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("a program is already running")]
    AlreadyRunning,

    #[error("the command queue is empty")]
    NothingToRun,

    #[error("time is up")]
    TimeUp,
}
