//! Per-participant availability ledger.

use rustc_hash::FxHashMap;

use super::core::LookupMiss;
use super::grid::{DayTimeGrid, SlotKey};

/// One boolean per (day, slot): true = available.
#[derive(Clone, Debug)]
pub struct AvailabilityLedger {
    participant: String,
    chart: FxHashMap<String, FxHashMap<SlotKey, bool>>,
}

impl AvailabilityLedger {
    /// Create a ledger with every slot of `grid` available.
    pub fn new(participant: impl Into<String>, grid: &DayTimeGrid) -> Self {
        let chart = grid
            .days()
            .map(|day| {
                let slots = day.slots().iter().map(|s| (SlotKey::of(*s), true)).collect();
                (day.name().to_string(), slots)
            })
            .collect();
        Self {
            participant: participant.into(),
            chart,
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Mark a slot unavailable. Returns false if the day/slot is unknown (no-op).
    pub fn mark_unavailable(&mut self, day: &str, slot: f64) -> bool {
        self.set(day, slot, false)
    }

    /// Mark a slot available. Returns false if the day/slot is unknown (no-op).
    pub fn mark_available(&mut self, day: &str, slot: f64) -> bool {
        self.set(day, slot, true)
    }

    fn set(&mut self, day: &str, slot: f64, available: bool) -> bool {
        match self
            .chart
            .get_mut(day)
            .and_then(|slots| slots.get_mut(&SlotKey::of(slot)))
        {
            Some(entry) => {
                *entry = available;
                true
            }
            None => false,
        }
    }

    /// True iff every slot in `slots` is available on `day`.
    ///
    /// Unknown days or slots are reported as a lookup miss rather than folded
    /// into "unavailable".
    pub fn is_available_for(&self, day: &str, slots: &[f64]) -> Result<bool, LookupMiss> {
        let chart = self
            .chart
            .get(day)
            .ok_or_else(|| LookupMiss::UnknownDay(day.to_string()))?;
        let mut available = true;
        for &slot in slots {
            match chart.get(&SlotKey::of(slot)) {
                Some(true) => {}
                Some(false) => available = false,
                None => {
                    return Err(LookupMiss::UnknownSlot {
                        day: day.to_string(),
                        slot,
                    })
                }
            }
        }
        Ok(available)
    }

    /// Number of slots currently marked unavailable.
    pub fn conflict_count(&self) -> usize {
        self.chart
            .values()
            .map(|slots| slots.values().filter(|a| !**a).count())
            .sum()
    }
}
