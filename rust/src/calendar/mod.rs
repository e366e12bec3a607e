//! Availability model: the day-time grid, per-participant ledgers and the
//! calendar that owns them.

mod core;
mod grid;
mod ledger;

pub use core::{Calendar, CalendarError, LookupMiss};
pub use grid::{slots_between, DayTimeGrid, GridDay, SlotKey};
pub use ledger::AvailabilityLedger;
