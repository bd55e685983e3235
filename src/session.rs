//! A player's session: the loaded level, the command queue, routine bodies and the
//! in-flight run.
//!
//! The session is the mutual-exclusion point the engine relies on. While a run is
//! in flight the queue and routines are frozen and a second run cannot start.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::LevelCatalog;
use crate::error::{CatalogError, QueueError, SessionError};
use crate::expander::ExpansionWarning;
use crate::interpreter::{EngineConfig, Execution, RunObserver, RunPhase, RunReport, RunState, Step};
use crate::level::LevelConfig;
use crate::robot::{Command, FunctionDefinition, RobotState, Routine};
use crate::timer::LevelTimer;

/// Result of arming a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunStart {
    /// Length of the expanded program.
    pub steps: usize,
    pub warning: Option<ExpansionWarning>,
}

/// Where [`GameSession::complete_level`] went.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelAdvance {
    Next(u32),
    /// The last level was done; play starts again from the first.
    Wrapped(u32),
}

#[derive(Debug)]
pub struct GameSession {
    catalog: LevelCatalog,
    config: EngineConfig,
    level_index: usize,
    state: RunState,
    queue: Vec<Command>,
    functions: Vec<FunctionDefinition>,
    execution: Option<Execution>,
    warning: Option<ExpansionWarning>,
    timer: Option<LevelTimer>,
}

impl GameSession {
    /// Starts on the first level of `catalog`.
    pub fn new(catalog: LevelCatalog, config: EngineConfig) -> Self {
        let first = catalog.first();
        let state = RunState::for_level(first);
        let timer = first.time_limit.map(started_timer);
        Self {
            catalog,
            config,
            level_index: 0,
            state,
            queue: Vec::new(),
            functions: FunctionDefinition::empty_set(),
            execution: None,
            warning: None,
            timer,
        }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn level(&self) -> &LevelConfig {
        &self.catalog.levels()[self.level_index]
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn robot(&self) -> &RobotState {
        &self.state.robot
    }

    pub fn queue(&self) -> &[Command] {
        &self.queue
    }

    pub fn functions(&self) -> &[FunctionDefinition] {
        &self.functions
    }

    pub fn function(&self, routine: Routine) -> &[Command] {
        self.functions
            .iter()
            .find(|f| f.name == routine)
            .map(|f| f.commands.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_executing(&self) -> bool {
        self.execution.is_some()
    }

    pub fn warning(&self) -> Option<&ExpansionWarning> {
        self.warning.as_ref()
    }

    pub fn clear_warning(&mut self) {
        self.warning = None;
    }

    pub fn timer(&self) -> Option<&LevelTimer> {
        self.timer.as_ref()
    }

    /// Whether every goal of the current level has been collected.
    pub fn has_won(&self) -> bool {
        self.state.all_goals_collected(self.level())
    }

    // --- Levels ---

    /// Loads a level by id. Pose, collected items, paint and clock are reset; the
    /// queue and routines are kept. Any in-flight run is dropped.
    pub fn load_level(&mut self, id: u32) -> Result<(), SessionError> {
        let index = self
            .catalog
            .levels()
            .iter()
            .position(|l| l.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        self.level_index = index;
        self.reload();
        info!(level = id, name = %self.level().name, "level loaded");
        Ok(())
    }

    /// Reloads the current level and empties the queue.
    pub fn reset_level(&mut self) {
        self.reload();
        self.queue.clear();
        debug!(level = self.level().id, "level reset");
    }

    pub fn next_level(&mut self) -> Option<u32> {
        let id = self.catalog.next_id(self.level().id)?;
        self.load_level(id).ok()?;
        Some(id)
    }

    pub fn previous_level(&mut self) -> Option<u32> {
        let id = self.catalog.previous_id(self.level().id)?;
        self.load_level(id).ok()?;
        Some(id)
    }

    /// Moves on after a win: the next level, or back to the first after the last.
    pub fn complete_level(&mut self) -> Result<LevelAdvance, SessionError> {
        let current = self.level().id;
        let advance = match self.catalog.next_id(current) {
            Some(id) => LevelAdvance::Next(id),
            None => LevelAdvance::Wrapped(self.catalog.first().id),
        };
        let id = match advance {
            LevelAdvance::Next(id) | LevelAdvance::Wrapped(id) => id,
        };
        self.load_level(id)?;
        Ok(advance)
    }

    /// Replaces the level list (e.g. after the editor saves) and starts over on its
    /// first level.
    pub fn replace_catalog(&mut self, catalog: LevelCatalog) {
        self.catalog = catalog;
        self.level_index = 0;
        self.reload();
    }

    fn reload(&mut self) {
        let level = &self.catalog.levels()[self.level_index];
        self.state.reset(level);
        self.timer = level.time_limit.map(started_timer);
        self.execution = None;
        self.warning = None;
    }

    // --- Queue ---

    /// Appends to the main queue, up to the level's `maxCommands`.
    pub fn push_command(&mut self, command: Command) -> Result<(), QueueError> {
        self.ensure_idle()?;
        if let Some(limit) = self.level().max_commands
            && self.queue.len() >= limit as usize
        {
            return Err(QueueError::QueueFull { limit });
        }
        self.queue.push(command);
        Ok(())
    }

    pub fn remove_command(&mut self, index: usize) -> Result<Command, QueueError> {
        self.ensure_idle()?;
        if index >= self.queue.len() {
            return Err(QueueError::NoSuchIndex(index));
        }
        Ok(self.queue.remove(index))
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    // --- Routines ---

    /// Appends to a routine body, up to the level's limit for that routine.
    pub fn push_routine_command(&mut self, routine: Routine, command: Command) -> Result<(), QueueError> {
        self.ensure_idle()?;
        let limit = self.level().routine_limit(routine);
        let body = self.routine_mut(routine);
        if let Some(limit) = limit
            && body.len() >= limit as usize
        {
            return Err(QueueError::RoutineFull { routine, limit });
        }
        body.push(command);
        Ok(())
    }

    pub fn remove_routine_command(&mut self, routine: Routine, index: usize) -> Result<Command, QueueError> {
        self.ensure_idle()?;
        let body = self.routine_mut(routine);
        if index >= body.len() {
            return Err(QueueError::NoSuchIndex(index));
        }
        Ok(body.remove(index))
    }

    pub fn clear_routine(&mut self, routine: Routine) -> Result<(), QueueError> {
        self.ensure_idle()?;
        self.routine_mut(routine).clear();
        Ok(())
    }

    /// Whether a routine's body calls itself directly.
    pub fn is_self_recursive(&self, routine: Routine) -> bool {
        self.functions
            .iter()
            .find(|f| f.name == routine)
            .is_some_and(FunctionDefinition::is_self_recursive)
    }

    fn routine_mut(&mut self, routine: Routine) -> &mut Vec<Command> {
        let idx = match self.functions.iter().position(|f| f.name == routine) {
            Some(idx) => idx,
            None => {
                self.functions.push(FunctionDefinition::new(routine, Vec::new()));
                self.functions.len() - 1
            }
        };
        &mut self.functions[idx].commands
    }

    fn ensure_idle(&self) -> Result<(), QueueError> {
        if self.is_executing() {
            return Err(QueueError::Executing);
        }
        Ok(())
    }

    // --- Running ---

    /// Expands the queue and arms a run.
    ///
    /// An over-long program is refused and leaves the session idle. Expansion
    /// warnings are kept until [`clear_warning`](Self::clear_warning).
    pub fn start_run(&mut self) -> Result<RunStart, SessionError> {
        if self.is_executing() {
            return Err(SessionError::AlreadyRunning);
        }
        if self.timer.as_ref().is_some_and(LevelTimer::is_expired) {
            return Err(SessionError::TimeUp);
        }
        if self.queue.is_empty() {
            return Err(SessionError::NothingToRun);
        }
        self.warning = None;

        let execution = Execution::start(&self.queue, &self.functions, &self.config)?;
        self.warning = execution.warning().cloned();
        let start = RunStart {
            steps: execution.program().len(),
            warning: self.warning.clone(),
        };
        if !execution.is_finished() {
            self.execution = Some(execution);
        }
        Ok(start)
    }

    /// Executes one instruction of the in-flight run. Returns `None` when nothing
    /// is running. The session becomes idle again on the step that ends the run.
    pub fn tick<O: RunObserver + ?Sized>(&mut self, observer: &mut O) -> Option<Step> {
        let level = &self.catalog.levels()[self.level_index];
        let execution = self.execution.as_mut()?;
        let step = execution.step(level, &mut self.state, observer);
        if execution.is_finished() {
            self.execution = None;
            if step.as_ref().is_some_and(|s| s.phase == RunPhase::Won)
                && let Some(timer) = self.timer.as_mut()
            {
                timer.pause();
            }
        }
        step
    }

    /// Runs the in-flight program to the end without pausing.
    pub fn run_to_end<O: RunObserver + ?Sized>(&mut self, observer: &mut O) -> Option<RunReport> {
        let level = &self.catalog.levels()[self.level_index];
        let mut execution = self.execution.take()?;
        let report = execution.finish(level, &mut self.state, observer);
        if report.won
            && let Some(timer) = self.timer.as_mut()
        {
            timer.pause();
        }
        Some(report)
    }

    /// Counts the level clock down. Returns `true` when time runs out, in which
    /// case any in-flight run is stopped where it is.
    pub fn advance_clock(&mut self, elapsed: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        if !timer.advance(elapsed) {
            return false;
        }
        if self.execution.take().is_some() {
            warn!(level = self.level().id, "run stopped: time is up");
        }
        true
    }
}

fn started_timer(limit_secs: u32) -> LevelTimer {
    let mut timer = LevelTimer::new(limit_secs);
    timer.start();
    timer
}
