//! Feasibility checks: does a task fit at a (day, start slot)?

use std::fmt;

use crate::calendar::{Calendar, LookupMiss, SlotKey};
use crate::models::Task;

/// Outcome of a feasibility check.
///
/// Everything other than `Fits` means the placement is infeasible; the
/// variants keep "no such slot" apart from "somebody is busy".
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Fits,
    /// The task would end after the query window closes.
    OutOfWindow { end: f64, window_end: f64 },
    /// A slot the task needs does not exist (end of day, unknown day).
    Missing(LookupMiss),
    /// A required participant has a conflict in the span.
    Unavailable { participant: String },
}

impl Verdict {
    #[inline]
    pub fn fits(&self) -> bool {
        matches!(self, Verdict::Fits)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fits => write!(f, "fits"),
            Verdict::OutOfWindow { end, window_end } => {
                write!(f, "ends at {} past window end {}", end, window_end)
            }
            Verdict::Missing(miss) => write!(f, "{}", miss),
            Verdict::Unavailable { participant } => write!(f, "{} unavailable", participant),
        }
    }
}

/// Read-only view of a calendar answering placement questions.
///
/// Holds no state of its own, so checks are idempotent and the checker is
/// freely copyable.
#[derive(Clone, Copy, Debug)]
pub struct FeasibilityChecker<'a> {
    calendar: &'a Calendar,
}

impl<'a> FeasibilityChecker<'a> {
    pub fn new(calendar: &'a Calendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &'a Calendar {
        self.calendar
    }

    /// Slot values `task` would occupy starting at `start` (end-exclusive).
    pub fn occupied_slots(&self, task: &Task, start: f64) -> Vec<f64> {
        let interval = self.calendar.interval();
        (0..task.duration)
            .map(|i| start + interval * i as f64)
            .collect()
    }

    /// First slot value after the task.
    pub fn end_of(&self, task: &Task, start: f64) -> f64 {
        start + task.duration as f64 * self.calendar.interval()
    }

    /// Check `task` starting at `start` on `day`, optionally bounded by `window_end`.
    pub fn check(&self, task: &Task, day: &str, start: f64, window_end: Option<f64>) -> Verdict {
        let end = self.end_of(task, start);
        if let Some(window_end) = window_end {
            if SlotKey::of(end) > SlotKey::of(window_end) {
                return Verdict::OutOfWindow { end, window_end };
            }
        }

        let grid_day = match self.calendar.grid().day(day) {
            Some(d) => d,
            None => return Verdict::Missing(LookupMiss::UnknownDay(day.to_string())),
        };
        let slots = self.occupied_slots(task, start);
        if let Some(&slot) = slots.iter().find(|s| !grid_day.contains(**s)) {
            return Verdict::Missing(LookupMiss::UnknownSlot {
                day: day.to_string(),
                slot,
            });
        }

        match self
            .calendar
            .first_unavailable(task.participant_names(), day, &slots)
        {
            Ok(None) => Verdict::Fits,
            Ok(Some(participant)) => Verdict::Unavailable {
                participant: participant.to_string(),
            },
            Err(miss) => Verdict::Missing(miss),
        }
    }

    /// Boolean form of [`FeasibilityChecker::check`].
    #[inline]
    pub fn fits(&self, task: &Task, day: &str, start: f64, window_end: Option<f64>) -> bool {
        self.check(task, day, start, window_end).fits()
    }
}
