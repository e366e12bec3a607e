//! Calendar: participants, their ledgers, the recognized days and the slot interval.

use thiserror::Error;

use crate::interner::{ParticipantId, ParticipantInterner};
use crate::models::Conflict;

use super::grid::{DayTimeGrid, SlotKey};
use super::ledger::AvailabilityLedger;

/// A query named a day, slot or participant the calendar does not know.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupMiss {
    #[error("Unknown day: {0}")]
    UnknownDay(String),
    #[error("Unknown slot {slot} on {day}")]
    UnknownSlot { day: String, slot: f64 },
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),
}

/// Configuration errors raised while building or editing a calendar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Participant name must not be empty")]
    EmptyParticipantName,
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(String),
    #[error("Interval must be finite and no finer than the 0.0001 slot precision, got {0}")]
    InvalidInterval(f64),
    #[error("Day {day} has slot {found} at index {index}, expected {expected}")]
    NonUniformInterval {
        day: String,
        index: usize,
        expected: f64,
        found: f64,
    },
    #[error("Day {day} has slots {first} and {second} closer than the slot precision")]
    IndistinctSlots { day: String, first: f64, second: f64 },
    #[error("Day {day} has invalid slot value {slot}")]
    InvalidSlot { day: String, slot: f64 },
    #[error("Day {0} is not in the day-time grid")]
    DayNotInGrid(String),
    #[error("Day listed more than once: {0}")]
    DuplicateDay(String),
    #[error("Conflict rejected: {0}")]
    Conflict(#[from] LookupMiss),
}

/// Owns every participant's ledger plus the grid they are laid over.
#[derive(Clone, Debug)]
pub struct Calendar {
    participants: ParticipantInterner,
    ledgers: Vec<AvailabilityLedger>,
    grid: DayTimeGrid,
    interval: f64,
}

impl Calendar {
    /// Build a calendar and apply the initial conflicts.
    ///
    /// Only `days` are recognized, in the given order; each must be present in
    /// `grid` with slots spaced exactly `interval` apart.
    pub fn new<N, D>(
        names: &[N],
        grid: &DayTimeGrid,
        days: &[D],
        interval: f64,
        conflicts: &[Conflict],
    ) -> Result<Self, CalendarError>
    where
        N: AsRef<str>,
        D: AsRef<str>,
    {
        // An interval below the slot key precision would fold slots together.
        if !interval.is_finite() || interval <= 0.0 || SlotKey::of(interval) == SlotKey::of(0.0)
        {
            return Err(CalendarError::InvalidInterval(interval));
        }

        let mut participants = ParticipantInterner::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                return Err(CalendarError::EmptyParticipantName);
            }
            let (_, added) = participants.intern(name);
            if !added {
                return Err(CalendarError::DuplicateParticipant(name.to_string()));
            }
        }

        let grid = grid.restrict(days, interval)?;
        let ledgers = Self::fresh_ledgers(&participants, &grid);

        let mut calendar = Self {
            participants,
            ledgers,
            grid,
            interval,
        };
        for conflict in conflicts {
            calendar.add_conflict(conflict)?;
        }
        Ok(calendar)
    }

    fn fresh_ledgers(
        participants: &ParticipantInterner,
        grid: &DayTimeGrid,
    ) -> Vec<AvailabilityLedger> {
        participants
            .names()
            .map(|name| AvailabilityLedger::new(name, grid))
            .collect()
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Grid of recognized days, in registration order.
    pub fn grid(&self) -> &DayTimeGrid {
        &self.grid
    }

    pub fn days(&self) -> impl Iterator<Item = &str> {
        self.grid.days().map(|d| d.name())
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.participants.names()
    }

    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.get(name).is_some()
    }

    pub fn ledger(&self, name: &str) -> Option<&AvailabilityLedger> {
        self.participants
            .get(name)
            .map(|id| &self.ledgers[id as usize])
    }

    fn participant_id(&self, name: &str) -> Result<ParticipantId, LookupMiss> {
        self.participants
            .get(name)
            .ok_or_else(|| LookupMiss::UnknownParticipant(name.to_string()))
    }

    /// Validate a whole conflict before any ledger is touched.
    fn resolve_conflict(
        &self,
        participant: &str,
        day: &str,
        slots: &[f64],
    ) -> Result<ParticipantId, LookupMiss> {
        let id = self.participant_id(participant)?;
        let grid_day = self
            .grid
            .day(day)
            .ok_or_else(|| LookupMiss::UnknownDay(day.to_string()))?;
        if let Some(&slot) = slots.iter().find(|s| !grid_day.contains(**s)) {
            return Err(LookupMiss::UnknownSlot {
                day: day.to_string(),
                slot,
            });
        }
        Ok(id)
    }

    /// Mark `participant` unavailable at each of `slots` on `day`.
    pub fn apply_conflict(
        &mut self,
        participant: &str,
        day: &str,
        slots: &[f64],
    ) -> Result<(), CalendarError> {
        let id = self.resolve_conflict(participant, day, slots)?;
        let ledger = &mut self.ledgers[id as usize];
        for &slot in slots {
            ledger.mark_unavailable(day, slot);
        }
        Ok(())
    }

    /// Mark `participant` available again at each of `slots` on `day`.
    pub fn clear_conflict(
        &mut self,
        participant: &str,
        day: &str,
        slots: &[f64],
    ) -> Result<(), CalendarError> {
        let id = self.resolve_conflict(participant, day, slots)?;
        let ledger = &mut self.ledgers[id as usize];
        for &slot in slots {
            ledger.mark_available(day, slot);
        }
        Ok(())
    }

    pub fn add_conflict(&mut self, conflict: &Conflict) -> Result<(), CalendarError> {
        self.apply_conflict(&conflict.participant, &conflict.day, &conflict.slots)
    }

    pub fn remove_conflict(&mut self, conflict: &Conflict) -> Result<(), CalendarError> {
        self.clear_conflict(&conflict.participant, &conflict.day, &conflict.slots)
    }

    /// Rebuild every ledger as fully available, dropping all conflicts.
    pub fn reset_all(&mut self) {
        self.ledgers = Self::fresh_ledgers(&self.participants, &self.grid);
    }

    /// Alias of [`Calendar::reset_all`].
    pub fn clear_conflicts(&mut self) {
        self.reset_all();
    }

    /// Availability of a single participant.
    pub fn participant_is_available(
        &self,
        participant: &str,
        day: &str,
        slots: &[f64],
    ) -> Result<bool, LookupMiss> {
        let id = self.participant_id(participant)?;
        self.ledgers[id as usize].is_available_for(day, slots)
    }

    /// First participant in `participants` who cannot make every slot, if any.
    ///
    /// Every name is resolved before any ledger is read, so an unknown
    /// participant is reported no matter where it sits in the group.
    pub fn first_unavailable<'p, I>(
        &self,
        participants: I,
        day: &str,
        slots: &[f64],
    ) -> Result<Option<&'p str>, LookupMiss>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let resolved = participants
            .into_iter()
            .map(|name| self.participant_id(name).map(|id| (name, id)))
            .collect::<Result<Vec<_>, LookupMiss>>()?;
        for (name, id) in resolved {
            if !self.ledgers[id as usize].is_available_for(day, slots)? {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    /// True iff every named participant is available for every slot.
    pub fn group_is_available<'p, I>(
        &self,
        participants: I,
        day: &str,
        slots: &[f64],
    ) -> Result<bool, LookupMiss>
    where
        I: IntoIterator<Item = &'p str>,
    {
        Ok(self.first_unavailable(participants, day, slots)?.is_none())
    }
}
