//! Lazy exhaustive scans built on the feasibility checker.
//!
//! Both iterators borrow the calendar and registry, hold only cursor
//! positions, and are `Clone`; cloning one (or asking the scheduler again)
//! restarts the scan.

use crate::calendar::SlotKey;
use crate::models::{Placement, Task};

use super::feasibility::FeasibilityChecker;
use super::registry::TaskRegistry;

/// Every (day, slot) in the calendar where one task fits, with no window bound.
///
/// Days come in registration order, slots ascending within a day.
#[derive(Clone, Debug)]
pub struct ValidStarts<'a> {
    checker: FeasibilityChecker<'a>,
    task: &'a Task,
    day_idx: usize,
    slot_idx: usize,
}

impl<'a> ValidStarts<'a> {
    pub fn new(checker: FeasibilityChecker<'a>, task: &'a Task) -> Self {
        Self {
            checker,
            task,
            day_idx: 0,
            slot_idx: 0,
        }
    }
}

impl<'a> Iterator for ValidStarts<'a> {
    type Item = Placement;

    fn next(&mut self) -> Option<Placement> {
        let grid = self.checker.calendar().grid();
        while let Some(day) = grid.day_at(self.day_idx) {
            while let Some(&slot) = day.slots().get(self.slot_idx) {
                self.slot_idx += 1;
                if self.checker.fits(self.task, day.name(), slot, None) {
                    return Some(Placement::new(day.name(), slot));
                }
            }
            self.day_idx += 1;
            self.slot_idx = 0;
        }
        None
    }
}

/// A task that fits inside a query window, and where it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowFit<'a> {
    pub task_id: &'a str,
    pub slot: f64,
}

/// Slack when skipping candidate starts that precede a day's first slot.
const SKIP_EPSILON: f64 = 1e-9;

/// Every (task, start slot) with the task finishing inside `[start, end)` on one day.
///
/// Tasks come in registration order; for each task, candidate starts ascend.
/// Candidates are `start + k * interval`, computed one at a time and clipped to
/// the day's own slot range, so a wide window costs nothing up front.
#[derive(Clone, Debug)]
pub struct WindowFits<'a> {
    checker: FeasibilityChecker<'a>,
    registry: &'a TaskRegistry,
    day: String,
    start: f64,
    end: f64,
    interval: f64,
    /// Last candidate worth trying: the day's final slot or just below `end`.
    stop: Option<SlotKey>,
    first_step: u64,
    step: u64,
    task_idx: usize,
}

impl<'a> WindowFits<'a> {
    pub fn new(
        checker: FeasibilityChecker<'a>,
        registry: &'a TaskRegistry,
        day: &str,
        start: f64,
        end: f64,
    ) -> Self {
        let interval = checker.calendar().interval();
        let bounds = checker
            .calendar()
            .grid()
            .day(day)
            .and_then(|d| Some((*d.slots().first()?, *d.slots().last()?)));

        let (stop, first_step) = match bounds {
            Some((first, last)) if start.is_finite() && end.is_finite() && end > start => {
                let skip = ((first - start) / interval - SKIP_EPSILON).ceil();
                let first_step = if skip > 0.0 { skip as u64 } else { 0 };
                (Some(SlotKey::of(last)), first_step)
            }
            _ => (None, 0),
        };

        Self {
            checker,
            registry,
            day: day.to_string(),
            start,
            end,
            interval,
            stop,
            first_step,
            step: first_step,
            task_idx: 0,
        }
    }

    fn candidate(&self) -> Option<f64> {
        let slot = self.start + self.interval * self.step as f64;
        let key = SlotKey::of(slot);
        if key >= SlotKey::of(self.end) || Some(key) > self.stop {
            return None;
        }
        Some(slot)
    }
}

impl<'a> Iterator for WindowFits<'a> {
    type Item = WindowFit<'a>;

    fn next(&mut self) -> Option<WindowFit<'a>> {
        self.stop?;
        let registry: &'a TaskRegistry = self.registry;
        while let Some(task) = registry.at(self.task_idx) {
            while let Some(slot) = self.candidate() {
                self.step += 1;
                if self.checker.fits(task, &self.day, slot, Some(self.end)) {
                    return Some(WindowFit {
                        task_id: task.id(),
                        slot,
                    });
                }
            }
            self.task_idx += 1;
            self.step = self.first_step;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::calendar::{Calendar, DayTimeGrid};
    use crate::config::SearchConfig;
    use crate::models::{Conflict, Placement, Task};
    use crate::scheduler::{BacktrackingScheduler, SchedulerError, TaskRegistry, WindowFit};

    fn scheduler(conflicts: &[Conflict]) -> BacktrackingScheduler {
        let grid = DayTimeGrid::new()
            .with_day("D1", vec![1.0, 1.5, 2.0, 2.5])
            .with_day("D2", vec![7.0, 7.5, 8.0]);
        let calendar = Calendar::new(&["A", "B"], &grid, &["D1", "D2"], 0.5, conflicts).unwrap();
        let registry = TaskRegistry::new(vec![
            Task::new("long", 3, &["A"]).unwrap(),
            Task::new("pair", 2, &["A", "B"]).unwrap(),
        ])
        .unwrap();
        BacktrackingScheduler::new(calendar, registry, SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_all_valid_starts_in_grid_order() {
        let s = scheduler(&[]);
        let starts: Vec<Placement> = s.all_valid_starts("long").unwrap().collect();
        assert_eq!(
            starts,
            vec![
                Placement::new("D1", 1.0),
                Placement::new("D1", 1.5),
                Placement::new("D2", 7.0),
            ]
        );
    }

    #[test]
    fn test_all_valid_starts_respects_conflicts() {
        let s = scheduler(&[Conflict::new("B", "D1", vec![1.5])]);
        let starts: Vec<String> = s
            .all_valid_starts("pair")
            .unwrap()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(starts, vec!["D1 at 2", "D2 at 7", "D2 at 7.5"]);
    }

    #[test]
    fn test_all_valid_starts_is_restartable() {
        let s = scheduler(&[]);
        let mut starts = s.all_valid_starts("long").unwrap();
        let snapshot = starts.clone();
        assert!(starts.next().is_some());
        assert_eq!(snapshot.count(), 3);
        assert_eq!(starts.count(), 2);
        assert_eq!(s.all_valid_starts("long").unwrap().count(), 3);
    }

    #[test]
    fn test_all_valid_starts_unknown_task() {
        let s = scheduler(&[]);
        assert!(matches!(
            s.all_valid_starts("nope"),
            Err(SchedulerError::UnknownTask(_))
        ));
    }

    #[test]
    fn test_tasks_fitting_window() {
        let s = scheduler(&[]);
        let fits: Vec<(String, f64)> = s
            .tasks_fitting_window("D1", 1.0, 2.5)
            .unwrap()
            .map(|f| (f.task_id.to_string(), f.slot))
            .collect();
        assert_eq!(
            fits,
            vec![
                ("long".to_string(), 1.0),
                ("pair".to_string(), 1.0),
                ("pair".to_string(), 1.5),
            ]
        );
    }

    #[test]
    fn test_tasks_fitting_huge_window_is_lazy() {
        let s = scheduler(&[]);
        let mut fits = s.tasks_fitting_window("D1", 1.0, 1.0e12).unwrap();
        assert_eq!(
            fits.next(),
            Some(WindowFit {
                task_id: "long",
                slot: 1.0
            })
        );
        assert_eq!(fits.count(), 4);

        let everything = s.tasks_fitting_window("D1", -1.0e12, 1.0e12).unwrap();
        let slots: Vec<f64> = everything.map(|f| f.slot).collect();
        assert_eq!(slots, vec![1.0, 1.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_tasks_fitting_window_off_grid_start() {
        let s = scheduler(&[]);
        assert_eq!(s.tasks_fitting_window("D1", 1.25, 2.5).unwrap().count(), 0);
    }

    #[test]
    fn test_tasks_fitting_window_edge_cases() {
        let s = scheduler(&[]);
        assert_eq!(s.tasks_fitting_window("D1", 2.0, 2.0).unwrap().count(), 0);
        assert!(matches!(
            s.tasks_fitting_window("D9", 1.0, 2.0),
            Err(SchedulerError::UnknownDay(_))
        ));
    }
}
