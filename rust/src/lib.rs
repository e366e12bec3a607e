//! Constraint-satisfaction scheduler for rehearsal-style calendars.
//!
//! Tasks ("scenes") need a contiguous run of fixed-width slots and every one of
//! their participants; participants declare conflicts per (day, slot). The
//! backtracking search returns the first assignment that double-books nobody.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;
use std::collections::HashMap;

pub mod calendar;
mod config;
mod interner;
pub mod logging;
mod models;
pub mod scheduler;

pub use calendar::{
    slots_between, AvailabilityLedger, Calendar, CalendarError, DayTimeGrid, GridDay, LookupMiss,
    SlotKey,
};
pub use config::SearchConfig;
pub use interner::{ParticipantId, ParticipantInterner};
pub use models::{
    slot_to_time, Conflict, Placement, ScheduleAssignment, ScheduledTask, Task, TaskError,
};
pub use scheduler::{
    BacktrackingScheduler, FeasibilityChecker, ScheduleOutcome, SchedulerError, TaskRegistry,
    ValidStarts, Verdict, WindowFit, WindowFits,
};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

/// Scheduler handle exposed to Python.
///
/// Owns the calendar and the scenes; every scheduling action goes through it.
#[pyclass(name = "Scheduler")]
#[derive(Clone, Debug)]
pub struct PyScheduler {
    inner: BacktrackingScheduler,
}

#[pymethods]
impl PyScheduler {
    /// Build the calendar and task registry in one step.
    ///
    /// # Arguments
    /// * `names` - Participant names
    /// * `day_time_chart` - Dict mapping day name to its slot start values
    /// * `days` - Days to recognize, in order
    /// * `interval` - Width of one slot (e.g. 0.5 for half-hour slots)
    /// * `tasks` - Tasks (scenes) to register
    /// * `conflicts` - Initial participant conflicts
    /// * `config` - Search configuration
    ///
    /// # Raises
    /// * ValueError on malformed grids, duplicate names or unknown references
    #[new]
    #[pyo3(signature = (names, day_time_chart, days, interval, tasks, conflicts=None, config=None))]
    fn new(
        names: Vec<String>,
        day_time_chart: HashMap<String, Vec<f64>>,
        days: Vec<String>,
        interval: f64,
        tasks: Vec<Task>,
        conflicts: Option<Vec<Conflict>>,
        config: Option<SearchConfig>,
    ) -> PyResult<Self> {
        let grid: DayTimeGrid = day_time_chart.into_iter().collect();
        let inner = BacktrackingScheduler::from_parts(
            &names,
            &grid,
            &days,
            interval,
            &conflicts.unwrap_or_default(),
            tasks,
            config.unwrap_or_default(),
        )
        .map_err(value_error)?;
        Ok(Self { inner })
    }

    /// Schedule `tasks` (in order) over `days`.
    ///
    /// # Returns
    /// * ScheduleAssignment, or None if no schedule exists
    ///
    /// # Raises
    /// * ValueError for unknown days or tasks
    /// * RuntimeError if the search exceeded `SearchConfig.max_nodes`
    fn schedule(&self, days: Vec<String>, tasks: Vec<String>) -> PyResult<Option<ScheduleAssignment>> {
        match self.inner.schedule(&days, &tasks).map_err(value_error)? {
            ScheduleOutcome::Scheduled(assignment) => Ok(Some(assignment)),
            ScheduleOutcome::NoSchedule { .. } => Ok(None),
            ScheduleOutcome::Aborted { nodes_visited } => Err(
                pyo3::exceptions::PyRuntimeError::new_err(format!(
                    "Search aborted after {} nodes",
                    nodes_visited
                )),
            ),
        }
    }

    fn add_conflict(&mut self, conflict: Conflict) -> PyResult<()> {
        self.inner
            .calendar_mut()
            .add_conflict(&conflict)
            .map_err(value_error)
    }

    fn remove_conflict(&mut self, conflict: Conflict) -> PyResult<()> {
        self.inner
            .calendar_mut()
            .remove_conflict(&conflict)
            .map_err(value_error)
    }

    /// Drop every conflict, leaving all participants fully available.
    fn clear_conflicts(&mut self) {
        self.inner.calendar_mut().clear_conflicts();
    }

    /// All (day, slot) placements where a task can start.
    fn times_for_task(&self, task: &str) -> PyResult<Vec<Placement>> {
        Ok(self.inner.all_valid_starts(task).map_err(value_error)?.collect())
    }

    /// All (task id, slot) pairs fitting inside `[start, end)` on `day`.
    fn tasks_that_fit(&self, day: &str, start: f64, end: f64) -> PyResult<Vec<(String, f64)>> {
        Ok(self
            .inner
            .tasks_fitting_window(day, start, end)
            .map_err(value_error)?
            .map(|fit| (fit.task_id.to_string(), fit.slot))
            .collect())
    }

    #[getter]
    fn config(&self) -> SearchConfig {
        self.inner.config().clone()
    }

    #[setter]
    fn set_config(&mut self, config: SearchConfig) {
        self.inner.set_config(config);
    }

    fn __repr__(&self) -> String {
        format!(
            "Scheduler(participants={}, days={}, tasks={}, interval={})",
            self.inner.calendar().participants().count(),
            self.inner.calendar().days().count(),
            self.inner.registry().len(),
            self.inner.calendar().interval()
        )
    }
}

/// The callboard.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Task>()?;
    m.add_class::<Conflict>()?;
    m.add_class::<Placement>()?;
    m.add_class::<ScheduledTask>()?;
    m.add_class::<ScheduleAssignment>()?;

    // Config types
    m.add_class::<SearchConfig>()?;

    // Scheduler
    m.add_class::<PyScheduler>()?;

    Ok(())
}
