//! Backtracking scheduler: depth-first placement of tasks on a flattened timeline.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::calendar::{Calendar, CalendarError, DayTimeGrid};
use crate::config::SearchConfig;
use crate::models::{Conflict, ScheduleAssignment, ScheduledTask, Task};
use crate::{log_changes, log_checks, log_debug};

use super::feasibility::{FeasibilityChecker, Verdict};
use super::queries::{ValidStarts, WindowFits};
use super::registry::TaskRegistry;
use super::state::{SearchState, Timeline};

/// Errors that can occur while setting up or running a search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Task registered more than once: {0}")]
    DuplicateTask(String),
    #[error("Task listed more than once in schedule request: {0}")]
    DuplicateTaskInOrder(String),
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Unknown day: {0}")]
    UnknownDay(String),
    #[error("Day listed more than once in schedule request: {0}")]
    DuplicateDay(String),
    #[error("Task {task} requires unknown participant {participant}")]
    UnknownParticipant { task: String, participant: String },
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Result of a `schedule` call that ran to completion or was cut off.
#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleOutcome {
    /// Every task was placed.
    Scheduled(ScheduleAssignment),
    /// The search space was exhausted: no schedule exists for this order.
    NoSchedule { nodes_visited: u64 },
    /// The node budget ran out before the search finished.
    Aborted { nodes_visited: u64 },
}

impl ScheduleOutcome {
    pub fn assignment(&self) -> Option<&ScheduleAssignment> {
        match self {
            ScheduleOutcome::Scheduled(assignment) => Some(assignment),
            _ => None,
        }
    }

    pub fn into_assignment(self) -> Option<ScheduleAssignment> {
        match self {
            ScheduleOutcome::Scheduled(assignment) => Some(assignment),
            _ => None,
        }
    }

    pub fn nodes_visited(&self) -> u64 {
        match self {
            ScheduleOutcome::Scheduled(a) => a.nodes_visited,
            ScheduleOutcome::NoSchedule { nodes_visited }
            | ScheduleOutcome::Aborted { nodes_visited } => *nodes_visited,
        }
    }
}

/// Internal result of one search node.
enum Step {
    Solved,
    Exhausted,
    Aborted,
}

/// Everything a search needs that does not change while it runs.
struct SearchContext<'a> {
    checker: FeasibilityChecker<'a>,
    timeline: Timeline,
    order: Vec<&'a Task>,
}

/// Places tasks, in a caller-given order, into the first feasible slots.
///
/// The scheduler owns its calendar; conflicts can only be edited through
/// [`BacktrackingScheduler::calendar_mut`], which the borrow checker keeps
/// apart from any running search.
#[derive(Clone, Debug)]
pub struct BacktrackingScheduler {
    calendar: Calendar,
    registry: TaskRegistry,
    config: SearchConfig,
}

impl BacktrackingScheduler {
    /// Create a scheduler, checking every task's participants against the calendar.
    pub fn new(
        calendar: Calendar,
        registry: TaskRegistry,
        config: SearchConfig,
    ) -> Result<Self, SchedulerError> {
        for task in registry.iter() {
            if let Some(missing) = task.participant_names().find(|p| !calendar.has_participant(p)) {
                return Err(SchedulerError::UnknownParticipant {
                    task: task.id.clone(),
                    participant: missing.to_string(),
                });
            }
        }
        Ok(Self {
            calendar,
            registry,
            config,
        })
    }

    /// Build calendar, registry and scheduler in one step.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts<N, D>(
        names: &[N],
        grid: &DayTimeGrid,
        days: &[D],
        interval: f64,
        conflicts: &[Conflict],
        tasks: Vec<Task>,
        config: SearchConfig,
    ) -> Result<Self, SchedulerError>
    where
        N: AsRef<str>,
        D: AsRef<str>,
    {
        let calendar = Calendar::new(names, grid, days, interval, conflicts)?;
        let registry = TaskRegistry::new(tasks)?;
        Self::new(calendar, registry, config)
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Mutable calendar access for conflict edits between searches.
    pub fn calendar_mut(&mut self) -> &mut Calendar {
        &mut self.calendar
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
    }

    pub fn checker(&self) -> FeasibilityChecker<'_> {
        FeasibilityChecker::new(&self.calendar)
    }

    /// Does task `task_id` fit at `start` on `day`?
    pub fn check(
        &self,
        task_id: &str,
        day: &str,
        start: f64,
        window_end: Option<f64>,
    ) -> Result<Verdict, SchedulerError> {
        let task = self.registry.require(task_id)?;
        Ok(self.checker().check(task, day, start, window_end))
    }

    /// Search for a full assignment of `task_order` over `days`.
    ///
    /// Tasks are committed in the given order and each is tried at every
    /// timeline position in ascending order, so the result is deterministic
    /// for identical input.
    pub fn schedule<D, T>(&self, days: &[D], task_order: &[T]) -> Result<ScheduleOutcome, SchedulerError>
    where
        D: AsRef<str>,
        T: AsRef<str>,
    {
        let verbosity = self.config.verbosity;
        let context = self.prepare(days, task_order)?;
        log_debug!(
            verbosity,
            "Timeline: {} positions over {} days, {} tasks",
            context.timeline.len(),
            days.len(),
            context.order.len()
        );

        let mut state = SearchState::new(context.timeline.len(), context.order.len());
        let outcome = match self.solve(&context, &mut state, 0) {
            Step::Solved => {
                ScheduleOutcome::Scheduled(self.build_assignment(&context, &state))
            }
            Step::Exhausted => ScheduleOutcome::NoSchedule {
                nodes_visited: state.nodes(),
            },
            Step::Aborted => ScheduleOutcome::Aborted {
                nodes_visited: state.nodes(),
            },
        };

        match &outcome {
            ScheduleOutcome::Scheduled(a) => {
                log_changes!(verbosity, "Schedule found after {} nodes", a.nodes_visited)
            }
            ScheduleOutcome::NoSchedule { nodes_visited } => {
                log_changes!(verbosity, "No schedule exists ({} nodes)", nodes_visited)
            }
            ScheduleOutcome::Aborted { nodes_visited } => {
                log_changes!(verbosity, "Search aborted after {} nodes", nodes_visited)
            }
        }
        Ok(outcome)
    }

    /// Resolve the request's days and tasks before any search starts.
    fn prepare<D, T>(&self, days: &[D], task_order: &[T]) -> Result<SearchContext<'_>, SchedulerError>
    where
        D: AsRef<str>,
        T: AsRef<str>,
    {
        let mut day_indices = Vec::with_capacity(days.len());
        let mut seen_days: FxHashSet<&str> = FxHashSet::default();
        for day in days {
            let day = day.as_ref();
            if !seen_days.insert(day) {
                return Err(SchedulerError::DuplicateDay(day.to_string()));
            }
            let idx = self
                .calendar
                .grid()
                .day_position(day)
                .ok_or_else(|| SchedulerError::UnknownDay(day.to_string()))?;
            day_indices.push(idx);
        }

        let mut order = Vec::with_capacity(task_order.len());
        let mut seen_tasks: FxHashSet<&str> = FxHashSet::default();
        for id in task_order {
            let id = id.as_ref();
            if !seen_tasks.insert(id) {
                return Err(SchedulerError::DuplicateTaskInOrder(id.to_string()));
            }
            order.push(self.registry.require(id)?);
        }

        Ok(SearchContext {
            checker: self.checker(),
            timeline: Timeline::build(&self.calendar, &day_indices),
            order,
        })
    }

    /// Place task `scene_idx` and everything after it, or report failure.
    fn solve(&self, context: &SearchContext<'_>, state: &mut SearchState, scene_idx: usize) -> Step {
        let task = match context.order.get(scene_idx) {
            Some(task) => *task,
            None => return Step::Solved,
        };

        let nodes = state.visit();
        if self.config.budget_exceeded(nodes) {
            return Step::Aborted;
        }
        let verbosity = self.config.verbosity;
        let len = task.duration as usize;

        for position in 0..context.timeline.len() {
            if !state.is_free(position, len) {
                continue;
            }
            let entry = match context.timeline.get(position) {
                Some(entry) => *entry,
                None => break,
            };
            let day = match self.calendar.grid().day_at(entry.day_idx) {
                Some(day) => day.name(),
                None => continue,
            };

            // The occupancy vector cannot see day boundaries; the checker can.
            let verdict = context.checker.check(task, day, entry.slot, None);
            if !verdict.fits() {
                log_checks!(
                    verbosity,
                    "    Skipping {} at {} {}: {}",
                    task.id,
                    day,
                    entry.slot,
                    verdict
                );
                continue;
            }

            state.place(scene_idx, position, len);
            log_changes!(verbosity, "  Placed {} at {} {}", task.id, day, entry.slot);

            match self.solve(context, state, scene_idx + 1) {
                Step::Solved => return Step::Solved,
                Step::Aborted => return Step::Aborted,
                Step::Exhausted => {
                    state.unplace(scene_idx, position, len);
                    log_changes!(verbosity, "  Undid {} at {} {}", task.id, day, entry.slot);
                }
            }
        }

        Step::Exhausted
    }

    fn build_assignment(&self, context: &SearchContext<'_>, state: &SearchState) -> ScheduleAssignment {
        let scheduled_tasks = context
            .order
            .iter()
            .zip(state.assignment())
            .filter_map(|(task, position)| {
                let entry = context.timeline.get((*position)?)?;
                let day = self.calendar.grid().day_at(entry.day_idx)?;
                Some(ScheduledTask {
                    task_id: task.id.clone(),
                    day: day.name().to_string(),
                    start_slot: entry.slot,
                    end_slot: context.checker.end_of(task, entry.slot),
                    duration: task.duration,
                    participants: task.participants.clone(),
                })
            })
            .collect();

        ScheduleAssignment {
            scheduled_tasks,
            nodes_visited: state.nodes(),
        }
    }

    /// Every (day, slot) across the whole calendar where `task_id` fits.
    pub fn all_valid_starts(&self, task_id: &str) -> Result<ValidStarts<'_>, SchedulerError> {
        let task = self.registry.require(task_id)?;
        Ok(ValidStarts::new(self.checker(), task))
    }

    /// Every (task, slot) with the task fitting inside `[start, end)` on `day`.
    pub fn tasks_fitting_window(
        &self,
        day: &str,
        start: f64,
        end: f64,
    ) -> Result<WindowFits<'_>, SchedulerError> {
        if self.calendar.grid().day(day).is_none() {
            return Err(SchedulerError::UnknownDay(day.to_string()));
        }
        Ok(WindowFits::new(self.checker(), &self.registry, day, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::LookupMiss;
    use crate::models::Placement;

    fn scheduler(tasks: Vec<Task>, conflicts: &[Conflict]) -> BacktrackingScheduler {
        let grid = DayTimeGrid::new().with_day("D1", vec![1.0, 1.5, 2.0, 2.5]);
        let calendar = Calendar::new(&["A", "B"], &grid, &["D1"], 0.5, conflicts).unwrap();
        let registry = TaskRegistry::new(tasks).unwrap();
        BacktrackingScheduler::new(calendar, registry, SearchConfig::default()).unwrap()
    }

    fn placement_of(outcome: &ScheduleOutcome, task_id: &str) -> Placement {
        outcome.assignment().unwrap().get(task_id).unwrap().placement()
    }

    #[test]
    fn test_earliest_start_without_conflicts() {
        let s = scheduler(vec![Task::new("task", 2, &["A"]).unwrap()], &[]);
        let outcome = s.schedule(&["D1"], &["task"]).unwrap();
        assert_eq!(placement_of(&outcome, "task"), Placement::new("D1", 1.0));

        let scheduled = outcome.assignment().unwrap().get("task").unwrap();
        assert_eq!(scheduled.end_slot, 2.0);
    }

    #[test]
    fn test_conflict_shifts_start() {
        let s = scheduler(
            vec![Task::new("task", 2, &["A"]).unwrap()],
            &[Conflict::new("A", "D1", vec![1.0])],
        );
        let outcome = s.schedule(&["D1"], &["task"]).unwrap();
        assert_eq!(placement_of(&outcome, "task"), Placement::new("D1", 1.5));
    }

    #[test]
    fn test_two_tasks_fill_day_exactly() {
        let s = scheduler(
            vec![
                Task::new("task1", 2, &["A"]).unwrap(),
                Task::new("task2", 2, &["A"]).unwrap(),
            ],
            &[],
        );
        let outcome = s.schedule(&["D1"], &["task1", "task2"]).unwrap();
        assert_eq!(placement_of(&outcome, "task1"), Placement::new("D1", 1.0));
        assert_eq!(placement_of(&outcome, "task2"), Placement::new("D1", 2.0));

        let reversed = s.schedule(&["D1"], &["task2", "task1"]).unwrap();
        assert_eq!(placement_of(&reversed, "task2"), Placement::new("D1", 1.0));
        assert_eq!(placement_of(&reversed, "task1"), Placement::new("D1", 2.0));
    }

    #[test]
    fn test_backtracks_when_first_choice_blocks_later_task() {
        // task1 fits anywhere; task2 needs B who is only free at 1.0-2.0,
        // so task1 must move off its earliest start.
        let s = scheduler(
            vec![
                Task::new("task1", 2, &["A"]).unwrap(),
                Task::new("task2", 2, &["B"]).unwrap(),
            ],
            &[Conflict::new("B", "D1", vec![2.0, 2.5])],
        );
        let outcome = s.schedule(&["D1"], &["task1", "task2"]).unwrap();
        assert_eq!(placement_of(&outcome, "task1"), Placement::new("D1", 2.0));
        assert_eq!(placement_of(&outcome, "task2"), Placement::new("D1", 1.0));
    }

    #[test]
    fn test_task_longer_than_any_day_has_no_schedule() {
        let s = scheduler(
            vec![
                Task::new("short", 1, &["A"]).unwrap(),
                Task::new("long", 5, &["A"]).unwrap(),
            ],
            &[],
        );
        assert!(matches!(
            s.schedule(&["D1"], &["long"]).unwrap(),
            ScheduleOutcome::NoSchedule { .. }
        ));
        assert!(matches!(
            s.schedule(&["D1"], &["short", "long"]).unwrap(),
            ScheduleOutcome::NoSchedule { .. }
        ));
    }

    #[test]
    fn test_tasks_never_span_days() {
        let grid = DayTimeGrid::new()
            .with_day("D1", vec![1.0, 1.5])
            .with_day("D2", vec![2.0, 2.5]);
        let calendar = Calendar::new(&["A"], &grid, &["D1", "D2"], 0.5, &[]).unwrap();
        let registry = TaskRegistry::new(vec![
            Task::new("one", 1, &["A"]).unwrap(),
            Task::new("two", 2, &["A"]).unwrap(),
        ])
        .unwrap();
        let s = BacktrackingScheduler::new(calendar, registry, SearchConfig::default()).unwrap();

        // "one" takes D1 1.0; timeline positions 1-2 look contiguous but
        // straddle D1 and D2, so "two" must go to D2.
        let outcome = s.schedule(&["D1", "D2"], &["one", "two"]).unwrap();
        assert_eq!(placement_of(&outcome, "one"), Placement::new("D1", 1.0));
        assert_eq!(placement_of(&outcome, "two"), Placement::new("D2", 2.0));
    }

    #[test]
    fn test_day_subset_limits_search() {
        let grid = DayTimeGrid::uniform(&["D1", "D2"], 1.0, 3.0, 0.5);
        let calendar = Calendar::new(&["A"], &grid, &["D1", "D2"], 0.5, &[]).unwrap();
        let registry = TaskRegistry::new(vec![Task::new("t", 2, &["A"]).unwrap()]).unwrap();
        let s = BacktrackingScheduler::new(calendar, registry, SearchConfig::default()).unwrap();

        let outcome = s.schedule(&["D2"], &["t"]).unwrap();
        assert_eq!(placement_of(&outcome, "t"), Placement::new("D2", 1.0));
    }

    #[test]
    fn test_empty_task_list_is_trivially_scheduled() {
        let s = scheduler(vec![], &[]);
        let outcome = s.schedule(&["D1"], &[] as &[&str]).unwrap();
        assert!(outcome.assignment().unwrap().is_empty());
    }

    #[test]
    fn test_request_errors() {
        let s = scheduler(vec![Task::new("t", 1, &["A"]).unwrap()], &[]);
        assert_eq!(
            s.schedule(&["D9"], &["t"]).unwrap_err(),
            SchedulerError::UnknownDay("D9".to_string())
        );
        assert_eq!(
            s.schedule(&["D1", "D1"], &["t"]).unwrap_err(),
            SchedulerError::DuplicateDay("D1".to_string())
        );
        assert_eq!(
            s.schedule(&["D1"], &["x"]).unwrap_err(),
            SchedulerError::UnknownTask("x".to_string())
        );
        assert_eq!(
            s.schedule(&["D1"], &["t", "t"]).unwrap_err(),
            SchedulerError::DuplicateTaskInOrder("t".to_string())
        );
    }

    #[test]
    fn test_from_parts_surfaces_calendar_errors() {
        let grid = DayTimeGrid::uniform(&["D1"], 1.0, 2.0, 0.5);
        let err = BacktrackingScheduler::from_parts(
            &["A"],
            &grid,
            &["D1"],
            0.5,
            &[Conflict::new("A", "D1", vec![5.0])],
            vec![],
            SearchConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Calendar(CalendarError::Conflict(LookupMiss::UnknownSlot { .. }))
        ));

        let s = BacktrackingScheduler::from_parts(
            &["A"],
            &grid,
            &["D1"],
            0.5,
            &[],
            vec![Task::new("t", 1, &["A"]).unwrap()],
            SearchConfig::default(),
        )
        .unwrap();
        assert_eq!(s.registry().len(), 1);
    }

    #[test]
    fn test_unknown_participant_rejected_at_construction() {
        let grid = DayTimeGrid::uniform(&["D1"], 1.0, 2.0, 0.5);
        let calendar = Calendar::new(&["A"], &grid, &["D1"], 0.5, &[]).unwrap();
        let registry = TaskRegistry::new(vec![Task::new("t", 1, &["A", "Z"]).unwrap()]).unwrap();
        let err = BacktrackingScheduler::new(calendar, registry, SearchConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::UnknownParticipant {
                task: "t".to_string(),
                participant: "Z".to_string()
            }
        );
    }

    #[test]
    fn test_node_budget_aborts() {
        // Three one-slot tasks for A over a day where A is only free once:
        // exhaustive search needs more nodes than the budget allows.
        let mut s = scheduler(
            vec![
                Task::new("a", 1, &["A"]).unwrap(),
                Task::new("b", 1, &["A"]).unwrap(),
                Task::new("c", 1, &["A"]).unwrap(),
            ],
            &[Conflict::new("A", "D1", vec![1.5, 2.0])],
        );
        s.set_config(SearchConfig {
            verbosity: 0,
            max_nodes: Some(2),
        });
        assert!(matches!(
            s.schedule(&["D1"], &["a", "b", "c"]).unwrap(),
            ScheduleOutcome::Aborted { .. }
        ));

        s.set_config(SearchConfig::default());
        assert!(matches!(
            s.schedule(&["D1"], &["a", "b", "c"]).unwrap(),
            ScheduleOutcome::NoSchedule { .. }
        ));
    }

    #[test]
    fn test_budget_spent_exactly_still_solves() {
        let mut s = scheduler(vec![Task::new("task", 2, &["A"]).unwrap()], &[]);
        s.set_config(SearchConfig {
            verbosity: 0,
            max_nodes: Some(1),
        });
        let outcome = s.schedule(&["D1"], &["task"]).unwrap();
        assert_eq!(placement_of(&outcome, "task"), Placement::new("D1", 1.0));
        assert_eq!(outcome.nodes_visited(), 1);
    }

    #[test]
    fn test_conflict_edits_between_runs() {
        let mut s = scheduler(vec![Task::new("task", 2, &["A"]).unwrap()], &[]);
        s.calendar_mut().apply_conflict("A", "D1", &[1.0]).unwrap();
        let outcome = s.schedule(&["D1"], &["task"]).unwrap();
        assert_eq!(placement_of(&outcome, "task"), Placement::new("D1", 1.5));

        s.calendar_mut().reset_all();
        let outcome = s.schedule(&["D1"], &["task"]).unwrap();
        assert_eq!(placement_of(&outcome, "task"), Placement::new("D1", 1.0));
    }

    #[test]
    fn test_check_exposes_verdict() {
        let s = scheduler(
            vec![Task::new("task", 2, &["A"]).unwrap()],
            &[Conflict::new("A", "D1", vec![2.0])],
        );
        assert!(matches!(
            s.check("task", "D1", 1.5, None).unwrap(),
            Verdict::Unavailable { .. }
        ));
        assert!(matches!(
            s.check("task", "D1", 2.5, None).unwrap(),
            Verdict::Missing(_)
        ));
    }
}
