//! Execution comparison for logicgit.
//!
//! - [`report`] — [`DiffReport`]: what changed between two executions
//! - [`state_diff`] — dotted-path comparison of two record states

pub mod report;
pub mod state_diff;

pub use report::{diff_executions, DiffReport};
pub use state_diff::{diff_states, flatten, StateChange, StateDiff};
