//! Scheduler module: task registry, feasibility checks and the backtracking search.
//!
//! The search linearizes the requested days into one timeline and tries each
//! task, in the caller's order, at every free position until all tasks are
//! placed or every option is exhausted.

mod core;
mod feasibility;
mod queries;
mod registry;
mod state;

pub use core::{BacktrackingScheduler, ScheduleOutcome, SchedulerError};
pub use feasibility::{FeasibilityChecker, Verdict};
pub use queries::{ValidStarts, WindowFit, WindowFits};
pub use registry::TaskRegistry;
pub use state::{SearchState, Timeline, TimelineEntry};
