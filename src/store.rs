// Owned, persisted task collection

use crate::backend::Backend;
use crate::error::{Result, StoreError};
use crate::filter::Query;
use crate::persist;
use crate::record::{NewTask, Task, TaskId};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Result of `TaskStore::remove_completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// No completed tasks existed; nothing was touched
    NothingToDelete,
    /// This many tasks were removed
    Removed(usize),
}

/// Counters shown alongside the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
}

/// In-memory task list backed by a storage slot
///
/// Every mutation rewrites the whole collection before returning. The
/// in-memory state only changes once that write has succeeded.
pub struct TaskStore {
    backend: Box<dyn Backend>,
    key: String,
    tasks: Vec<Task>,
    /// Highest id ever issued for this slot
    last_issued: Option<TaskId>,
}

impl TaskStore {
    /// Load the collection stored under `key` in `backend`
    pub fn open(backend: Box<dyn Backend>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        crate::backend::validate_key(&key)?;

        let tasks = persist::load(&*backend, &key)?;
        let highest_stored = tasks.iter().map(Task::id).max();
        let last_issued = persist::load_sequence(&*backend, &key)?.max(highest_stored);

        info!(key = %key, count = tasks.len(), last_issued = ?last_issued, "Opened task store");
        Ok(Self {
            backend,
            key,
            tasks,
            last_issued,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed()).count()
    }

    pub fn active_count(&self) -> usize {
        self.count() - self.completed_count()
    }

    pub fn stats(&self, today: NaiveDate) -> Stats {
        let completed = self.completed_count();
        Stats {
            total: self.count(),
            active: self.count() - completed,
            completed,
            overdue: self.tasks.iter().filter(|t| t.is_overdue(today)).count(),
        }
    }

    /// Filtered, sorted view of the current tasks
    pub fn view(&self, query: &Query) -> Vec<&Task> {
        query.apply(&self.tasks)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a task; blank text is rejected silently with `Ok(None)`
    pub fn add(&mut self, new: NewTask) -> Result<Option<TaskId>> {
        let text = new.text.trim();
        if text.is_empty() {
            debug!("Ignoring task with empty text");
            return Ok(None);
        }

        let id = self.allocate_id();
        let mut tasks = self.tasks.clone();
        tasks.push(Task::from_parts(
            id,
            text.to_string(),
            false,
            new.priority,
            new.category.trim().to_string(),
            new.due_date,
            Utc::now(),
        ));

        let last_issued = self.last_issued.map_or(id, |last| last.max(id));
        persist::save_sequence(&mut *self.backend, &self.key, last_issued)?;
        self.commit(tasks)?;
        self.last_issued = Some(last_issued);
        debug!(id = %id, "Added task");
        Ok(Some(id))
    }

    /// Flip completion; returns the new state
    pub fn toggle_completed(&mut self, id: TaskId) -> Result<bool> {
        let mut tasks = self.tasks.clone();
        let completed = find_mut(&mut tasks, id)?.toggle();
        self.commit(tasks)?;
        debug!(id = %id, completed, "Toggled task");
        Ok(completed)
    }

    /// Replace the text; blank text leaves the task unchanged and returns `false`
    pub fn edit_text(&mut self, id: TaskId, text: &str) -> Result<bool> {
        let mut tasks = self.tasks.clone();
        if !find_mut(&mut tasks, id)?.set_text(text) {
            debug!(id = %id, "Edit with empty text, leaving task unchanged");
            return Ok(false);
        }
        self.commit(tasks)?;
        debug!(id = %id, "Edited task");
        Ok(true)
    }

    /// Delete one task; other tasks keep their ids
    pub fn remove(&mut self, id: TaskId) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(StoreError::NotFound(id))?;
        let mut tasks = self.tasks.clone();
        let removed = tasks.remove(index);
        self.commit(tasks)?;
        debug!(id = %id, "Removed task");
        Ok(removed)
    }

    /// Delete every task; returns how many were removed
    pub fn remove_all(&mut self) -> Result<usize> {
        let count = self.tasks.len();
        self.commit(Vec::new())?;
        debug!(count, "Removed all tasks");
        Ok(count)
    }

    /// Delete completed tasks, or report that there are none
    pub fn remove_completed(&mut self) -> Result<RemoveOutcome> {
        let count = self.completed_count();
        if count == 0 {
            return Ok(RemoveOutcome::NothingToDelete);
        }
        let tasks = self.tasks.iter().filter(|t| !t.is_completed()).cloned().collect();
        self.commit(tasks)?;
        debug!(count, "Removed completed tasks");
        Ok(RemoveOutcome::Removed(count))
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    /// Next id after the high-water mark, or the lowest free one once `u64::MAX` is taken
    fn allocate_id(&self) -> TaskId {
        match self.last_issued {
            None => TaskId::new(1),
            Some(last) => last
                .checked_next()
                .unwrap_or_else(|| TaskId::lowest_unused(|id| self.get(id).is_some())),
        }
    }

    /// Persist `tasks`, then adopt them as the current collection
    fn commit(&mut self, tasks: Vec<Task>) -> Result<()> {
        persist::save(&mut *self.backend, &self.key, &tasks)?;
        self.tasks = tasks;
        Ok(())
    }
}

fn find_mut(tasks: &mut [Task], id: TaskId) -> Result<&mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id() == id)
        .ok_or(StoreError::NotFound(id))
}
