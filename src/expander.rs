//! Inlines sub-routine calls into a flat instruction list.
//!
//! Expansion is depth-first and strictly left-to-right. Two limits keep it finite:
//!
//! * **Depth**: once more than [`ExpandLimits::max_recursion_depth`] routine bodies
//!   are open, the innermost call contributes nothing.
//! * **Calls per path**: a call to a routine that already appears
//!   [`ExpandLimits::max_function_calls`] times on the current call path is dropped.
//!   Counts are scoped to the path from the root, so siblings do not share them.
//!
//! Neither limit is an error. The expansion keeps whatever it produced and reports
//! the last limit it ran into as an [`ExpansionWarning`].
//!
//! Within those limits a few wide routines can still fan out exponentially, so the
//! walk also carries a work budget derived from [`ExpandLimits::max_commands`]. Once
//! routine bodies push the output past that many instructions, or open far more
//! bodies than such an output could need, the walk is abandoned and the result is
//! marked [`Expansion::truncated`]. Plain top-level commands are always copied.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::interpreter::MAX_EXECUTION_STEPS;
use crate::robot::{Command, FunctionDefinition, Routine};

/// Maximum number of nested routine bodies.
pub const MAX_RECURSION_DEPTH: usize = 50;

/// Maximum number of times one routine may appear on a single call path.
pub const MAX_FUNCTION_CALLS: usize = 10;

/// Bounds applied by [`expand_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandLimits {
    /// Nested bodies allowed before the innermost call is dropped.
    pub max_recursion_depth: usize,
    /// Times one routine may be open on a single call path.
    pub max_function_calls: usize,
    /// Output size past which routine expansion is abandoned. Defaults to the
    /// engine's step cap.
    pub max_commands: usize,
}

impl Default for ExpandLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: MAX_RECURSION_DEPTH,
            max_function_calls: MAX_FUNCTION_CALLS,
            max_commands: MAX_EXECUTION_STEPS,
        }
    }
}

impl ExpandLimits {
    /// How many routine bodies one walk may open. Every body that contributes
    /// output lies on the path of an emitted instruction, so `max_commands`
    /// instructions need at most `max_commands × depth` of them.
    fn body_budget(&self) -> usize {
        self.max_commands
            .saturating_add(1)
            .saturating_mul(self.max_recursion_depth.max(1))
    }
}

/// A limit hit while expanding. Shown to the player; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionWarning {
    #[error("depth limit reached ({limit} levels); expansion was cut short to avoid a hang")]
    DepthLimit { limit: usize },

    #[error(
        "recursion limit reached for {routine} ({limit} calls); it was expanded {limit} times and then stopped to avoid an infinite loop"
    )]
    CallLimit { routine: Routine, limit: usize },
}

/// Output of an expansion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Flat instruction stream. Contains no [`Command::Call`].
    pub commands: Vec<Command>,
    /// The last limit encountered in traversal order, if any.
    pub warning: Option<ExpansionWarning>,
    /// Set when the work budget ran out. `commands` is then only a prefix and the
    /// program should not be run.
    pub truncated: bool,
}

impl Expansion {
    /// Number of flat instructions produced.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing at all was produced.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Expands `commands` with the default limits.
pub fn expand(commands: &[Command], functions: &[FunctionDefinition]) -> Expansion {
    expand_with(commands, functions, ExpandLimits::default())
}

/// Expands `commands`, inlining every routine call found in `functions`.
///
/// Calls to routines with no definition or an empty body are dropped silently.
#[instrument(skip_all, fields(queued = commands.len()))]
pub fn expand_with(
    commands: &[Command],
    functions: &[FunctionDefinition],
    limits: ExpandLimits,
) -> Expansion {
    let mut expander = Expander {
        functions,
        limits,
        path_counts: [0; 3],
        opened: 0,
        out: Vec::with_capacity(commands.len()),
        warning: None,
        truncated: false,
    };
    expander.walk(commands, 0);

    trace!(expanded = expander.out.len(), truncated = expander.truncated, "expansion complete");
    Expansion {
        commands: expander.out,
        warning: expander.warning,
        truncated: expander.truncated,
    }
}

struct Expander<'a> {
    functions: &'a [FunctionDefinition],
    limits: ExpandLimits,
    /// How many times each routine is open on the current path, indexed by [`Routine::index`].
    path_counts: [usize; 3],
    /// Routine bodies opened so far, across the whole walk.
    opened: usize,
    out: Vec<Command>,
    warning: Option<ExpansionWarning>,
    truncated: bool,
}

impl Expander<'_> {
    fn walk(&mut self, commands: &[Command], depth: usize) {
        if depth > self.limits.max_recursion_depth {
            debug!(depth, "depth limit reached");
            self.warning = Some(ExpansionWarning::DepthLimit {
                limit: self.limits.max_recursion_depth,
            });
            return;
        }

        for &cmd in commands {
            if self.truncated && depth > 0 {
                return;
            }
            let Command::Call(routine) = cmd else {
                self.out.push(cmd);
                if depth > 0 && self.out.len() > self.limits.max_commands {
                    self.abandon("output budget exhausted");
                }
                continue;
            };
            if self.truncated {
                continue;
            }

            let functions = self.functions;
            let Some(body) = functions
                .iter()
                .find(|f| f.name == routine)
                .map(|f| f.commands.as_slice())
                .filter(|body| !body.is_empty())
            else {
                continue;
            };

            let slot = routine.index();
            if self.path_counts[slot] >= self.limits.max_function_calls {
                debug!(%routine, depth, "call limit reached; dropping call");
                self.warning = Some(ExpansionWarning::CallLimit {
                    routine,
                    limit: self.limits.max_function_calls,
                });
                continue;
            }

            self.opened += 1;
            if self.opened > self.limits.body_budget() {
                self.abandon("body budget exhausted");
                continue;
            }

            self.path_counts[slot] += 1;
            self.walk(body, depth + 1);
            self.path_counts[slot] -= 1;
        }
    }

    fn abandon(&mut self, reason: &'static str) {
        debug!(reason, expanded = self.out.len(), opened = self.opened, "expansion abandoned");
        self.truncated = true;
    }
}
