//! Task registry: task id -> task definition, in registration order.

use rustc_hash::FxHashMap;

use crate::models::Task;

use super::core::SchedulerError;

#[derive(Clone, Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: FxHashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new(tasks: Vec<Task>) -> Result<Self, SchedulerError> {
        let mut registry = Self {
            tasks: Vec::with_capacity(tasks.len()),
            index: FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default()),
        };
        for task in tasks {
            registry.register(task)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, task: Task) -> Result<(), SchedulerError> {
        if self.index.contains_key(&task.id) {
            return Err(SchedulerError::DuplicateTask(task.id));
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    /// Task at `idx` in registration order.
    #[inline]
    pub fn at(&self, idx: usize) -> Option<&Task> {
        self.tasks.get(idx)
    }

    /// Like [`TaskRegistry::get`] but reports the missing id.
    pub fn require(&self, id: &str) -> Result<&Task, SchedulerError> {
        self.get(id)
            .ok_or_else(|| SchedulerError::UnknownTask(id.to_string()))
    }

    /// Tasks in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task::new(id, 1, &["A"]).unwrap()
    }

    #[test]
    fn test_lookup_and_order() {
        let registry = TaskRegistry::new(vec![task("b"), task("a")]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(registry.get("a").unwrap().id, "a");
        assert!(registry.get("c").is_none());
        assert!(matches!(
            registry.require("c"),
            Err(SchedulerError::UnknownTask(id)) if id == "c"
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = TaskRegistry::new(vec![task("a"), task("a")]).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateTask(id) if id == "a"));
    }
}
