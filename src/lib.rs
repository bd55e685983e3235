//! # gridbot
//!
//! Engine for a visual-programming puzzle: the player queues commands (move, turn,
//! call a sub-routine, paint, test a color) that drive a robot across a grid to
//! collect every star while walls, locked doors and command budgets get in the way.
//!
//! The core is two pieces:
//!
//! * [`expander`] flattens the queue, inlining `F0`/`F1`/`F2` calls with bounded
//!   recursion, and reports truncation as a warning rather than an error.
//! * [`interpreter`] steps the robot through the flat program one instruction per
//!   tick, handling collisions, key/door gating, painting, conditional skips and
//!   the win condition.
//!
//! Rendering is left to the host. [`session::GameSession`] bundles the state a
//! host needs (queue, routines, current level, clock) around that core.

pub mod catalog;
pub mod error;
pub mod expander;
pub mod grid;
pub mod interpreter;
pub mod level;
pub mod robot;
pub mod session;
pub mod timer;

pub use catalog::*;
pub use error::*;
pub use expander::*;
pub use grid::*;
pub use interpreter::*;
pub use level::*;
pub use robot::*;
pub use session::*;
pub use timer::*;
