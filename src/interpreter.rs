//! Execution engine that steps the robot through an expanded program.
//!
//! The entry point is [`Execution`]. Build one with [`Execution::start`] (which
//! expands the queue and enforces the step cap), then call
//! [`Execution::step`] once per tick against a [`LevelConfig`] and a [`RunState`].
//! The engine never sleeps: every [`Step`] carries a suggested pause for the host
//! renderer, and a host that wants the final state immediately can call
//! [`Execution::finish`] or the [`run`] shortcut.
//!
//! # Per-instruction semantics
//!
//! * `PAINT_<c>` colors the cell under the robot, overwriting any previous color.
//! * `IF_<c>` skips the next instruction unless the cell under the robot is `c`.
//! * `MOVE` advances one cell unless the target is a wall, a locked door, or the
//!   board edge. `LEFT`/`RIGHT` rotate by 90 degrees and are never refused.
//! * After any of the three motion commands, keys and then goals on the robot's
//!   cell are collected.
//! * After every instruction the run ends as won if every goal has been collected.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::ExecutionError;
use crate::expander::{self, ExpandLimits, Expansion, ExpansionWarning};
use crate::grid::{Position, calculate_next_position, check_collision};
use crate::level::LevelConfig;
use crate::robot::{Color, Command, FunctionDefinition, RobotState};

/// Longest expanded program the engine will execute.
pub const MAX_EXECUTION_STEPS: usize = 1000;

/// Default pause between motion ticks, in milliseconds.
pub const EXECUTION_DELAY_MS: u64 = 300;

/// Default pause between motion ticks.
pub const EXECUTION_DELAY: Duration = Duration::from_millis(EXECUTION_DELAY_MS);

/// Configuration for expansion and execution.
///
/// The delays are presentation hints only; they never affect the final state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// See [`ExpandLimits::max_recursion_depth`].
    pub max_recursion_depth: usize,
    /// See [`ExpandLimits::max_function_calls`].
    pub max_function_calls: usize,
    /// Expanded programs longer than this are refused before the first step.
    pub max_execution_steps: usize,
    /// Pause after `MOVE`, `LEFT` and `RIGHT`, in milliseconds.
    pub step_delay_ms: u64,
    /// Pause after `PAINT_*` and `IF_*`, in milliseconds.
    pub paint_delay_ms: u64,
    /// Pause on the final cell before the win is announced, in milliseconds.
    pub win_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: expander::MAX_RECURSION_DEPTH,
            max_function_calls: expander::MAX_FUNCTION_CALLS,
            max_execution_steps: MAX_EXECUTION_STEPS,
            step_delay_ms: EXECUTION_DELAY_MS,
            paint_delay_ms: 150,
            win_delay_ms: 200,
        }
    }
}

impl EngineConfig {
    /// Same limits, no pauses. Handy for headless runs and tests.
    pub fn instant() -> Self {
        Self {
            step_delay_ms: 0,
            paint_delay_ms: 0,
            win_delay_ms: 0,
            ..Self::default()
        }
    }

    /// The expander bounds implied by this config. Expansion gives up once the
    /// output passes the step cap.
    pub fn expand_limits(&self) -> ExpandLimits {
        ExpandLimits {
            max_recursion_depth: self.max_recursion_depth,
            max_function_calls: self.max_function_calls,
            max_commands: self.max_execution_steps,
        }
    }

    /// [`step_delay_ms`](Self::step_delay_ms) as a `Duration`.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// [`paint_delay_ms`](Self::paint_delay_ms) as a `Duration`.
    pub fn paint_delay(&self) -> Duration {
        Duration::from_millis(self.paint_delay_ms)
    }

    /// [`win_delay_ms`](Self::win_delay_ms) as a `Duration`.
    pub fn win_delay(&self) -> Duration {
        Duration::from_millis(self.win_delay_ms)
    }
}

/// State that lives for one level attempt.
///
/// Collected goals and keys only grow while the level stays loaded; they are
/// emptied by [`RunState::reset`]. Consecutive runs share the same `RunState`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    pub robot: RobotState,
    pub collected_goals: HashSet<Position>,
    pub collected_keys: HashSet<String>,
    /// Working copy of the paint layer, seeded from the level.
    pub painted: HashMap<Position, Color>,
}

impl RunState {
    /// Fresh state with the robot on the level's start cell.
    pub fn for_level(level: &LevelConfig) -> Self {
        Self {
            robot: RobotState::at(level.robot_start),
            collected_goals: HashSet::new(),
            collected_keys: HashSet::new(),
            painted: level.initial_paint(),
        }
    }

    /// Back to [`for_level`](Self::for_level) for `level`.
    pub fn reset(&mut self, level: &LevelConfig) {
        *self = Self::for_level(level);
    }

    /// Current paint on `position`, if any.
    pub fn color_at(&self, position: Position) -> Option<Color> {
        self.painted.get(&position).copied()
    }

    /// Whether the key with this id has been picked up.
    pub fn has_key(&self, id: &str) -> bool {
        self.collected_keys.contains(id)
    }

    /// The id of a door at `position` whose key has not been collected yet.
    pub fn locked_door_at<'a>(&self, level: &'a LevelConfig, position: Position) -> Option<&'a str> {
        level
            .doors
            .iter()
            .find(|d| d.position == position && !self.has_key(&d.id))
            .map(|d| d.id.as_str())
    }

    /// Whether every goal of `level` has been collected.
    pub fn all_goals_collected(&self, level: &LevelConfig) -> bool {
        level
            .star_positions
            .iter()
            .all(|g| self.collected_goals.contains(g))
    }

    /// Collected goals as sorted `"x,y"` strings.
    pub fn goal_keys(&self) -> Vec<String> {
        let mut goals: Vec<Position> = self.collected_goals.iter().copied().collect();
        goals.sort();
        goals.into_iter().map(|p| p.to_string()).collect()
    }
}

/// Receives state changes as they happen. Every method defaults to a no-op.
pub trait RunObserver {
    /// Called after every executed instruction with the current pose.
    fn on_robot(&mut self, _robot: &RobotState) {}
    /// A goal was picked up for the first time this level attempt.
    fn on_goal_collected(&mut self, _goal: Position) {}
    /// A key was picked up for the first time this level attempt.
    fn on_key_collected(&mut self, _key_id: &str) {}
    /// A `PAINT_*` instruction colored `position`.
    fn on_paint(&mut self, _position: Position, _color: Color) {}
    /// Called exactly once per run, on the instruction that completes the level.
    fn on_win(&mut self) {}
}

impl RunObserver for () {}

/// Why a `MOVE` left the robot where it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Blocker {
    Wall,
    /// A door whose key has not been collected, by id.
    Door(String),
    /// The board edge (or a heading that is not a right angle).
    Boundary,
}

/// What one instruction did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepEffect {
    Moved { from: Position, to: Position },
    Blocked { at: Position, by: Blocker },
    Turned { rotation: i32 },
    Painted { position: Position, color: Color },
    /// An `IF_*` test. `skipped` is the instruction dropped when the test failed.
    Tested {
        color: Color,
        passed: bool,
        skipped: Option<Command>,
    },
    /// A routine call that survived expansion.
    Ignored,
}

/// Lifecycle of one execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Running,
    Won,
    Exhausted,
}

impl RunPhase {
    /// `Won` or `Exhausted`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Result of a single tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// Index of the executed instruction in the expanded program.
    pub index: usize,
    pub command: Command,
    pub effect: StepEffect,
    pub collected_goals: Vec<Position>,
    pub collected_keys: Vec<String>,
    /// Phase after this step.
    pub phase: RunPhase,
    /// Suggested pause before the next tick (or before announcing the win).
    pub delay: Duration,
}

/// Summary of a run driven to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub won: bool,
    /// Instructions executed, not counting skipped ones.
    pub steps: usize,
    pub robot: RobotState,
    pub warning: Option<ExpansionWarning>,
}

/// One pass over an expanded program.
#[derive(Clone, Debug)]
pub struct Execution {
    program: Vec<Command>,
    cursor: usize,
    steps: usize,
    phase: RunPhase,
    warning: Option<ExpansionWarning>,
    config: EngineConfig,
}

impl Execution {
    /// Expands `commands` and prepares to run them.
    ///
    /// Fails without touching any state when the expanded program is longer than
    /// [`EngineConfig::max_execution_steps`].
    #[instrument(skip_all, fields(queued = commands.len()))]
    pub fn start(
        commands: &[Command],
        functions: &[FunctionDefinition],
        config: &EngineConfig,
    ) -> Result<Self, ExecutionError> {
        let expansion = expander::expand_with(commands, functions, config.expand_limits());
        Self::from_expansion(expansion, config)
    }

    /// Prepares to run an already expanded program.
    ///
    /// A truncated expansion is refused like an over-long one, whatever its length.
    pub fn from_expansion(expansion: Expansion, config: &EngineConfig) -> Result<Self, ExecutionError> {
        let limit = config.max_execution_steps;
        if expansion.truncated || expansion.len() > limit {
            warn!(steps = expansion.len(), limit, truncated = expansion.truncated, "program too long; refusing to run");
            return Err(ExecutionError::StepLimitExceeded {
                steps: expansion.len(),
                limit,
            });
        }
        if let Some(warning) = &expansion.warning {
            debug!(%warning, "expansion truncated");
        }

        let phase = if expansion.is_empty() {
            RunPhase::Exhausted
        } else {
            RunPhase::Running
        };
        Ok(Self {
            program: expansion.commands,
            cursor: 0,
            steps: 0,
            phase,
            warning: expansion.warning,
            config: config.clone(),
        })
    }

    /// The flat instruction stream being executed.
    pub fn program(&self) -> &[Command] {
        &self.program
    }

    /// The expansion warning this run started with.
    pub fn warning(&self) -> Option<&ExpansionWarning> {
        self.warning.as_ref()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Whether the run has been won or has run out of instructions.
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Index of the next instruction to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Executes the next instruction. Returns `None` once the run has finished.
    pub fn step<O: RunObserver + ?Sized>(
        &mut self,
        level: &LevelConfig,
        state: &mut RunState,
        observer: &mut O,
    ) -> Option<Step> {
        if self.is_finished() {
            return None;
        }
        let index = self.cursor;
        let command = *self.program.get(index)?;
        self.cursor += 1;
        self.steps += 1;

        let mut collected_goals = Vec::new();
        let mut collected_keys = Vec::new();

        let effect = match command {
            Command::Paint(color) => {
                let position = state.robot.position();
                state.painted.insert(position, color);
                observer.on_paint(position, color);
                StepEffect::Painted { position, color }
            }
            Command::If(color) => {
                let passed = state.color_at(state.robot.position()) == Some(color);
                let skipped = if passed {
                    None
                } else {
                    let next = self.program.get(self.cursor).copied();
                    if next.is_some() {
                        self.cursor += 1;
                    }
                    next
                };
                StepEffect::Tested {
                    color,
                    passed,
                    skipped,
                }
            }
            Command::Move | Command::Left | Command::Right => {
                let effect = apply_motion(command, level, state);
                collect_here(level, state, observer, &mut collected_goals, &mut collected_keys);
                effect
            }
            // Expansion removes every call; a stray one does nothing.
            Command::Call(_) => StepEffect::Ignored,
        };
        observer.on_robot(&state.robot);

        trace!(index, %command, ?effect, "step");

        let mut delay = if command.is_motion() {
            self.config.step_delay()
        } else {
            self.config.paint_delay()
        };

        if state.all_goals_collected(level) {
            self.phase = RunPhase::Won;
            delay = self.config.win_delay();
            info!(level = level.id, steps = self.steps, "level complete");
            observer.on_win();
        } else if self.cursor >= self.program.len() {
            self.phase = RunPhase::Exhausted;
            info!(level = level.id, steps = self.steps, "program finished without completing the level");
        }

        Some(Step {
            index,
            command,
            effect,
            collected_goals,
            collected_keys,
            phase: self.phase,
            delay,
        })
    }

    /// Runs every remaining instruction without pausing.
    pub fn finish<O: RunObserver + ?Sized>(
        &mut self,
        level: &LevelConfig,
        state: &mut RunState,
        observer: &mut O,
    ) -> RunReport {
        while self.step(level, state, observer).is_some() {}
        RunReport {
            won: self.phase == RunPhase::Won,
            steps: self.steps,
            robot: state.robot,
            warning: self.warning.clone(),
        }
    }
}

/// Expands and executes `commands` in one go.
pub fn run<O: RunObserver + ?Sized>(
    level: &LevelConfig,
    state: &mut RunState,
    commands: &[Command],
    functions: &[FunctionDefinition],
    config: &EngineConfig,
    observer: &mut O,
) -> Result<RunReport, ExecutionError> {
    let mut execution = Execution::start(commands, functions, config)?;
    Ok(execution.finish(level, state, observer))
}

fn apply_motion(command: Command, level: &LevelConfig, state: &mut RunState) -> StepEffect {
    match command {
        Command::Left => {
            state.robot.turn_left();
            StepEffect::Turned {
                rotation: state.robot.rotation,
            }
        }
        Command::Right => {
            state.robot.turn_right();
            StepEffect::Turned {
                rotation: state.robot.rotation,
            }
        }
        _ => {
            let from = state.robot.position();
            let to = calculate_next_position(from, state.robot.rotation, level.grid_size);
            let blocker = if to == from {
                Some(Blocker::Boundary)
            } else if let Some(id) = state.locked_door_at(level, to) {
                Some(Blocker::Door(id.to_string()))
            } else if check_collision(to, &level.obstacles) {
                Some(Blocker::Wall)
            } else {
                None
            };

            match blocker {
                Some(by) => StepEffect::Blocked { at: to, by },
                None => {
                    state.robot.set_position(to);
                    StepEffect::Moved { from, to }
                }
            }
        }
    }
}

fn collect_here<O: RunObserver + ?Sized>(
    level: &LevelConfig,
    state: &mut RunState,
    observer: &mut O,
    goals: &mut Vec<Position>,
    keys: &mut Vec<String>,
) {
    let here = state.robot.position();

    for key in level.keys.iter().filter(|k| k.position == here) {
        if state.collected_keys.insert(key.id.clone()) {
            debug!(key = %key.id, at = %here, "key collected");
            observer.on_key_collected(&key.id);
            keys.push(key.id.clone());
        }
    }

    for &goal in level.star_positions.iter().filter(|&&g| g == here) {
        if state.collected_goals.insert(goal) {
            debug!(at = %goal, "goal collected");
            observer.on_goal_collected(goal);
            goals.push(goal);
        }
    }
}
