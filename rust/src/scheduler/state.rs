//! Run-scoped search state: the flattened timeline and the occupancy vector.

use crate::calendar::Calendar;

/// One timeline position: index of the day in the calendar grid plus the slot value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineEntry {
    pub day_idx: usize,
    pub slot: f64,
}

/// Requested days' slot lists concatenated in the order the days were given.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Flatten `day_indices` (positions in the calendar grid) into one sequence.
    pub fn build(calendar: &Calendar, day_indices: &[usize]) -> Self {
        let entries = day_indices
            .iter()
            .filter_map(|&idx| calendar.grid().day_at(idx).map(|day| (idx, day)))
            .flat_map(|(day_idx, day)| {
                day.slots()
                    .iter()
                    .map(move |&slot| TimelineEntry { day_idx, slot })
            })
            .collect();
        Self { entries }
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<&TimelineEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable state owned by exactly one `schedule` call.
///
/// `assignment[i]` is the timeline position chosen for the i-th task in the
/// commitment order.
#[derive(Clone, Debug)]
pub struct SearchState {
    occupancy: Vec<bool>,
    assignment: Vec<Option<usize>>,
    nodes: u64,
}

impl SearchState {
    pub fn new(timeline_len: usize, task_count: usize) -> Self {
        Self {
            occupancy: vec![false; timeline_len],
            assignment: vec![None; task_count],
            nodes: 0,
        }
    }

    /// True iff positions `start..start + len` exist and are all unclaimed.
    ///
    /// An empty run is never free: a placement must claim at least one position.
    #[inline]
    pub fn is_free(&self, start: usize, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        match start.checked_add(len) {
            Some(end) if end <= self.occupancy.len() => {
                self.occupancy[start..end].iter().all(|claimed| !claimed)
            }
            _ => false,
        }
    }

    /// Claim `start..start + len` for task `task_idx`.
    pub fn place(&mut self, task_idx: usize, start: usize, len: usize) {
        debug_assert!(self.is_free(start, len));
        self.occupancy[start..start + len].fill(true);
        self.assignment[task_idx] = Some(start);
    }

    /// Undo [`SearchState::place`].
    pub fn unplace(&mut self, task_idx: usize, start: usize, len: usize) {
        self.occupancy[start..start + len].fill(false);
        self.assignment[task_idx] = None;
    }

    pub fn assignment(&self) -> &[Option<usize>] {
        &self.assignment
    }

    /// Count one more expanded node, returning the new total.
    #[inline]
    pub fn visit(&mut self) -> u64 {
        self.nodes += 1;
        self.nodes
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn claimed(&self) -> usize {
        self.occupancy.iter().filter(|c| **c).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DayTimeGrid;

    #[test]
    fn test_timeline_follows_requested_day_order() {
        let grid = DayTimeGrid::new()
            .with_day("D1", vec![1.0, 1.5])
            .with_day("D2", vec![7.0]);
        let cal = Calendar::new(&["A"], &grid, &["D1", "D2"], 0.5, &[]).unwrap();

        let timeline = Timeline::build(&cal, &[1, 0]);
        assert_eq!(timeline.len(), 3);
        assert_eq!(
            timeline.get(0),
            Some(&TimelineEntry {
                day_idx: 1,
                slot: 7.0
            })
        );
        assert_eq!(timeline.get(2).map(|e| e.slot), Some(1.5));
        assert!(timeline.get(3).is_none());
    }

    #[test]
    fn test_place_and_unplace() {
        let mut state = SearchState::new(4, 2);
        assert!(state.is_free(0, 4));

        state.place(0, 1, 2);
        assert!(!state.is_free(0, 2));
        assert!(state.is_free(3, 1));
        assert_eq!(state.assignment(), &[Some(1), None]);
        assert_eq!(state.claimed(), 2);

        state.unplace(0, 1, 2);
        assert!(state.is_free(0, 4));
        assert_eq!(state.assignment(), &[None, None]);
    }

    #[test]
    fn test_out_of_range_is_not_free() {
        let state = SearchState::new(4, 1);
        assert!(!state.is_free(3, 2));
        assert!(!state.is_free(usize::MAX, 2));
    }

    #[test]
    fn test_empty_run_is_not_free() {
        let mut state = SearchState::new(4, 2);
        assert!(!state.is_free(0, 0));
        state.place(0, 0, 1);
        assert!(!state.is_free(0, 0));
        assert!(!state.is_free(4, 0));
    }

    #[test]
    fn test_visit_counts_nodes() {
        let mut state = SearchState::new(0, 0);
        assert_eq!(state.visit(), 1);
        assert_eq!(state.visit(), 2);
        assert_eq!(state.nodes(), 2);
    }
}
