//! Single-flight registry of running logical tasks

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Serialize)]
pub struct RunningTask {
    pub name: String,
    pub id: u64,
    pub pid: Option<u32>,
    pub started_at: DateTime<Local>,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<String, RunningTask>,
    next_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check and insert under one lock; returns the existing entry if taken
    pub fn try_register(&self, name: &str) -> Result<Registration, RunningTask> {
        let mut inner = self.lock();

        if let Some(existing) = inner.tasks.get(name) {
            return Err(existing.clone());
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.tasks.insert(
            name.to_string(),
            RunningTask {
                name: name.to_string(),
                id,
                pid: None,
                started_at: Local::now(),
            },
        );

        Ok(Registration {
            registry: self.clone(),
            name: name.to_string(),
            id,
        })
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock().tasks.contains_key(name)
    }

    /// Snapshot of running tasks sorted by name
    pub fn snapshot(&self) -> Vec<RunningTask> {
        let mut tasks: Vec<_> = self.lock().tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.name.cmp(&b.name));
        tasks
    }

    fn set_pid(&self, name: &str, id: u64, pid: u32) {
        if let Some(task) = self.lock().tasks.get_mut(name)
            && task.id == id
        {
            task.pid = Some(pid);
        }
    }

    fn release(&self, name: &str, id: u64) {
        let mut inner = self.lock();
        if inner.tasks.get(name).is_some_and(|task| task.id == id) {
            inner.tasks.remove(name);
        }
    }
}

/// Holds a registry slot; the slot is freed when this is dropped.
#[derive(Debug)]
pub struct Registration {
    registry: TaskRegistry,
    name: String,
    id: u64,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_pid(&self, pid: u32) {
        self.registry.set_pid(&self.name, self.id, pid);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.release(&self.name, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_registration_is_rejected() {
        let registry = TaskRegistry::new();
        let first = registry.try_register("installer").unwrap();
        first.set_pid(42);

        let existing = registry.try_register("installer").unwrap_err();
        assert_eq!(existing.name, "installer");
        assert_eq!(existing.pid, Some(42));

        assert!(registry.try_register("mirrorlist-update").is_ok());
    }

    #[test]
    fn test_drop_releases_slot() {
        let registry = TaskRegistry::new();
        {
            let _slot = registry.try_register("installer").unwrap();
            assert!(registry.is_running("installer"));
        }
        assert!(!registry.is_running("installer"));
        assert!(registry.try_register("installer").is_ok());
    }

    #[test]
    fn test_stale_release_keeps_newer_entry() {
        let registry = TaskRegistry::new();
        let first = registry.try_register("task").unwrap();
        let first_id = first.id;
        drop(first);

        let second = registry.try_register("task").unwrap();
        registry.release("task", first_id);
        assert!(registry.is_running("task"));
        drop(second);
        assert!(registry.snapshot().is_empty());
    }
}
