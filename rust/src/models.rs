//! Core data types crossing the library boundary.

use chrono::NaiveTime;
use pyo3::prelude::*;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised when building a task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task id must not be empty")]
    EmptyId,
    #[error("Task {0} must occupy at least one slot")]
    ZeroDuration(String),
    #[error("Task {0} has no participants")]
    NoParticipants(String),
}

/// A unit of work ("scene") that needs a contiguous run of slots and every
/// listed participant.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    #[pyo3(get)]
    pub(crate) id: String,
    /// Number of consecutive slots the task occupies.
    #[pyo3(get)]
    pub(crate) duration: u32,
    /// Speaking participants, as given.
    #[pyo3(get)]
    pub(crate) speaking: Vec<String>,
    /// Non-speaking participants, as given.
    #[pyo3(get)]
    pub(crate) non_speaking: Vec<String>,
    /// Everyone required: speaking then non-speaking, duplicates dropped.
    #[pyo3(get)]
    pub(crate) participants: Vec<String>,
}

impl Task {
    pub fn new<S: AsRef<str>>(
        id: impl Into<String>,
        duration: u32,
        participants: &[S],
    ) -> Result<Self, TaskError> {
        Self::with_roles(id, duration, participants, &[] as &[&str])
    }

    /// Build a task from speaking and non-speaking participants.
    ///
    /// Both groups are required for scheduling; the split is kept for display.
    pub fn with_roles<S: AsRef<str>, T: AsRef<str>>(
        id: impl Into<String>,
        duration: u32,
        speaking: &[S],
        non_speaking: &[T],
    ) -> Result<Self, TaskError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TaskError::EmptyId);
        }
        if duration == 0 {
            return Err(TaskError::ZeroDuration(id));
        }

        let speaking: Vec<String> = speaking.iter().map(|s| s.as_ref().to_string()).collect();
        let non_speaking: Vec<String> =
            non_speaking.iter().map(|s| s.as_ref().to_string()).collect();

        let mut participants: Vec<String> = Vec::with_capacity(speaking.len() + non_speaking.len());
        for name in speaking.iter().chain(non_speaking.iter()) {
            if !participants.contains(name) {
                participants.push(name.clone());
            }
        }
        if participants.is_empty() {
            return Err(TaskError::NoParticipants(id));
        }

        Ok(Self {
            id,
            duration,
            speaking,
            non_speaking,
            participants,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn speaking(&self) -> &[String] {
        &self.speaking
    }

    pub fn non_speaking(&self) -> &[String] {
        &self.non_speaking
    }

    /// Everyone required, speaking first.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn participant_names(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|s| s.as_str())
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (id, duration, speaking, non_speaking=None))]
    fn py_new(
        id: String,
        duration: u32,
        speaking: Vec<String>,
        non_speaking: Option<Vec<String>>,
    ) -> PyResult<Self> {
        Self::with_roles(id, duration, &speaking, &non_speaking.unwrap_or_default())
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, duration={}, participants={:?})",
            self.id, self.duration, self.participants
        )
    }
}

/// A participant's declared unavailability on one day.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    #[pyo3(get, set)]
    pub participant: String,
    #[pyo3(get, set)]
    pub day: String,
    #[pyo3(get, set)]
    pub slots: Vec<f64>,
}

impl Conflict {
    pub fn new(participant: impl Into<String>, day: impl Into<String>, slots: Vec<f64>) -> Self {
        Self {
            participant: participant.into(),
            day: day.into(),
            slots,
        }
    }
}

#[pymethods]
impl Conflict {
    #[new]
    fn py_new(participant: String, day: String, slots: Vec<f64>) -> Self {
        Self::new(participant, day, slots)
    }

    fn __repr__(&self) -> String {
        format!(
            "Conflict(participant={:?}, day={:?}, slots={:?})",
            self.participant, self.day, self.slots
        )
    }
}

/// A (day, slot) position on the calendar.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    #[pyo3(get)]
    pub day: String,
    #[pyo3(get)]
    pub slot: f64,
}

impl Placement {
    pub fn new(day: impl Into<String>, slot: f64) -> Self {
        Self {
            day: day.into(),
            slot,
        }
    }
}

#[pymethods]
impl Placement {
    /// Slot value read as hours since midnight (7.5 = 07:30).
    pub fn start_time(&self) -> Option<NaiveTime> {
        slot_to_time(self.slot)
    }

    fn __repr__(&self) -> String {
        format!("Placement(day={:?}, slot={})", self.day, self.slot)
    }

    fn __str__(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.day, self.slot)
    }
}

/// Convert an hours-since-midnight slot value to a wall-clock time.
pub fn slot_to_time(slot: f64) -> Option<NaiveTime> {
    if !slot.is_finite() || slot < 0.0 {
        return None;
    }
    let seconds = (slot * 3600.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

/// A task placed by the scheduler.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub day: String,
    #[pyo3(get)]
    pub start_slot: f64,
    /// First slot value after the task (not claimed by it).
    #[pyo3(get)]
    pub end_slot: f64,
    #[pyo3(get)]
    pub duration: u32,
    #[pyo3(get)]
    pub participants: Vec<String>,
}

impl ScheduledTask {
    pub fn placement(&self) -> Placement {
        Placement::new(self.day.clone(), self.start_slot)
    }
}

#[pymethods]
impl ScheduledTask {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledTask(task_id={:?}, day={:?}, start={}, end={})",
            self.task_id, self.day, self.start_slot, self.end_slot
        )
    }
}

/// Output of a successful search: every task with its (day, slot), in the
/// order the tasks were committed.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleAssignment {
    #[pyo3(get)]
    pub scheduled_tasks: Vec<ScheduledTask>,
    /// Search nodes expanded to find this assignment.
    #[pyo3(get)]
    pub nodes_visited: u64,
}

impl ScheduleAssignment {
    pub fn get(&self, task_id: &str) -> Option<&ScheduledTask> {
        self.scheduled_tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn len(&self) -> usize {
        self.scheduled_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled_tasks.is_empty()
    }
}

#[pymethods]
impl ScheduleAssignment {
    /// Placement of one task, or None if it was not part of this run.
    fn placement(&self, task_id: &str) -> Option<Placement> {
        self.get(task_id).map(|t| t.placement())
    }

    /// Mapping of task id to (day, slot).
    fn as_dict(&self) -> HashMap<String, (String, f64)> {
        self.scheduled_tasks
            .iter()
            .map(|t| (t.task_id.clone(), (t.day.clone(), t.start_slot)))
            .collect()
    }

    fn __len__(&self) -> usize {
        self.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleAssignment(scheduled_tasks={}, nodes_visited={})",
            self.scheduled_tasks.len(),
            self.nodes_visited
        )
    }
}
