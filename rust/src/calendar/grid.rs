//! Day-time grid: recognized days and their ordered slot start values.

use rustc_hash::FxHashMap;

use super::core::{CalendarError, LookupMiss};

/// Slot values are compared at this fixed precision (1/10000 of a unit).
const SLOT_PRECISION: f64 = 10_000.0;

/// Slack used when counting how many slots fit between two values.
const COUNT_EPSILON: f64 = 1e-9;

/// Fixed-precision key for a slot value.
///
/// Slot values are floats (`7.5` = half past seven), so lookups go through this
/// key to avoid float hashing issues and accumulated rounding from
/// `start + k * interval`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(i64);

impl SlotKey {
    #[inline]
    pub fn of(slot: f64) -> Self {
        SlotKey((slot * SLOT_PRECISION).round() as i64)
    }
}

/// Generate slot values from `start` up to but excluding `end`.
///
/// With interval 0.5, `slots_between(7.0, 8.0, 0.5)` yields `[7.0, 7.5]`.
pub fn slots_between(start: f64, end: f64, interval: f64) -> Vec<f64> {
    if interval.is_nan()
        || interval <= 0.0
        || !start.is_finite()
        || !end.is_finite()
        || end <= start
    {
        return Vec::new();
    }
    let count = ((end - start) / interval + COUNT_EPSILON).floor() as usize;
    (0..count).map(|i| start + interval * i as f64).collect()
}

/// One day of the grid.
#[derive(Clone, Debug)]
pub struct GridDay {
    name: String,
    slots: Vec<f64>,
    slot_index: FxHashMap<SlotKey, usize>,
}

impl GridDay {
    fn new(name: String, slots: Vec<f64>) -> Self {
        let slot_index = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (SlotKey::of(*s), i))
            .collect();
        Self {
            name,
            slots,
            slot_index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot start values, ascending.
    pub fn slots(&self) -> &[f64] {
        &self.slots
    }

    /// Position of `slot` within this day, if the day has it.
    #[inline]
    pub fn position(&self, slot: f64) -> Option<usize> {
        self.slot_index.get(&SlotKey::of(slot)).copied()
    }

    pub fn contains(&self, slot: f64) -> bool {
        self.position(slot).is_some()
    }

    /// Check that slots are distinct at key precision and increase by exactly `interval`.
    fn check_uniform(&self, interval: f64) -> Result<(), CalendarError> {
        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.is_finite() {
                return Err(CalendarError::InvalidSlot {
                    day: self.name.clone(),
                    slot: *slot,
                });
            }
            if index == 0 {
                continue;
            }
            let prev = self.slots[index - 1];
            if SlotKey::of(prev) == SlotKey::of(*slot) {
                return Err(CalendarError::IndistinctSlots {
                    day: self.name.clone(),
                    first: prev,
                    second: *slot,
                });
            }
            let expected = prev + interval;
            if SlotKey::of(expected) != SlotKey::of(*slot) {
                return Err(CalendarError::NonUniformInterval {
                    day: self.name.clone(),
                    index,
                    expected,
                    found: *slot,
                });
            }
        }
        Ok(())
    }
}

/// Mapping of day names to their slot lists, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct DayTimeGrid {
    days: Vec<GridDay>,
    day_index: FxHashMap<String, usize>,
}

impl DayTimeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid where every day shares the slots `[start, end)` at `interval`.
    pub fn uniform<S: AsRef<str>>(days: &[S], start: f64, end: f64, interval: f64) -> Self {
        let slots = slots_between(start, end, interval);
        days.iter()
            .map(|d| (d.as_ref().to_string(), slots.clone()))
            .collect()
    }

    /// Add a day, replacing its slot list if the day already exists.
    pub fn insert_day(&mut self, day: impl Into<String>, slots: Vec<f64>) {
        let day = day.into();
        match self.day_index.get(&day) {
            Some(&idx) => self.days[idx] = GridDay::new(day, slots),
            None => {
                self.day_index.insert(day.clone(), self.days.len());
                self.days.push(GridDay::new(day, slots));
            }
        }
    }

    pub fn with_day(mut self, day: impl Into<String>, slots: Vec<f64>) -> Self {
        self.insert_day(day, slots);
        self
    }

    pub fn day(&self, day: &str) -> Option<&GridDay> {
        self.day_index.get(day).map(|&idx| &self.days[idx])
    }

    pub fn day_at(&self, idx: usize) -> Option<&GridDay> {
        self.days.get(idx)
    }

    pub fn day_position(&self, day: &str) -> Option<usize> {
        self.day_index.get(day).copied()
    }

    pub fn days(&self) -> impl Iterator<Item = &GridDay> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Resolve a (day, slot) pair to grid positions.
    pub fn locate(&self, day: &str, slot: f64) -> Result<(usize, usize), LookupMiss> {
        let day_idx = self
            .day_position(day)
            .ok_or_else(|| LookupMiss::UnknownDay(day.to_string()))?;
        let slot_idx = self.days[day_idx]
            .position(slot)
            .ok_or_else(|| LookupMiss::UnknownSlot {
                day: day.to_string(),
                slot,
            })?;
        Ok((day_idx, slot_idx))
    }

    /// Keep only `days`, in that order, after checking each has uniform slots.
    pub(crate) fn restrict<S: AsRef<str>>(
        &self,
        days: &[S],
        interval: f64,
    ) -> Result<DayTimeGrid, CalendarError> {
        let mut restricted = DayTimeGrid::new();
        for day in days {
            let day = day.as_ref();
            if restricted.day_index.contains_key(day) {
                return Err(CalendarError::DuplicateDay(day.to_string()));
            }
            let source = self
                .day(day)
                .ok_or_else(|| CalendarError::DayNotInGrid(day.to_string()))?;
            source.check_uniform(interval)?;
            restricted.insert_day(day, source.slots.clone());
        }
        Ok(restricted)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<f64>)> for DayTimeGrid {
    fn from_iter<I: IntoIterator<Item = (S, Vec<f64>)>>(iter: I) -> Self {
        let mut grid = DayTimeGrid::new();
        for (day, slots) in iter {
            grid.insert_day(day, slots);
        }
        grid
    }
}
