// Load/save of the whole task collection to a backend slot

use crate::backend::Backend;
use crate::error::{BackendError, Result};
use crate::record::{DEFAULT_CATEGORY, Priority, Task, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Default slot holding the task array
pub const DEFAULT_KEY: &str = "todo";

/// On-disk shape of a task
///
/// `disabled` is the persisted name of the completion flag. `id` is absent in
/// data written before stable ids existed.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<TaskId>,
    text: String,
    #[serde(rename = "disabled", default)]
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default, with = "due_date")]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl From<&Task> for StoredTask {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id()),
            text: task.text().to_string(),
            completed: task.is_completed(),
            priority: task.priority(),
            category: task.category().to_string(),
            due_date: task.due_date(),
            created_at: Some(task.created_at()),
        }
    }
}

/// Slot holding the highest id ever issued
pub fn sequence_key(key: &str) -> String {
    format!("{}-seq", key)
}

/// Load the task collection from `key`
///
/// A missing slot, or one that is not a JSON array, yields an empty
/// collection. Entries that fail to decode are skipped one by one, so valid
/// tasks next to them survive. Only backend failures are returned as errors.
pub fn load(backend: &dyn Backend, key: &str) -> std::result::Result<Vec<Task>, BackendError> {
    let raw = match backend.get(key)? {
        Some(raw) => raw,
        None => {
            info!(key, "No stored tasks, starting empty");
            return Ok(Vec::new());
        }
    };

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(key, error = ?e, "Stored tasks are malformed, starting empty");
            return Ok(Vec::new());
        }
    };

    let mut stored = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<StoredTask>(entry) {
            Ok(task) => stored.push(task),
            Err(e) => {
                warn!(key, index, error = ?e, "Failed to parse stored task, skipping");
            }
        }
    }

    let tasks = assign_ids(stored);
    info!(key, count = tasks.len(), "Loaded tasks");
    Ok(tasks)
}

/// Serialize the full collection and overwrite `key`
pub fn save(backend: &mut dyn Backend, key: &str, tasks: &[Task]) -> Result<()> {
    let stored: Vec<StoredTask> = tasks.iter().map(StoredTask::from).collect();
    let json = serde_json::to_string(&stored)?;
    backend.set(key, &json)?;
    info!(key, count = tasks.len(), "Saved tasks");
    Ok(())
}

/// Pretty JSON for a view, in the same layout as the stored slot
pub fn to_json_pretty(view: &[&Task]) -> serde_json::Result<String> {
    let stored: Vec<StoredTask> = view.iter().map(|task| StoredTask::from(*task)).collect();
    serde_json::to_string_pretty(&stored)
}

/// Read the highest id ever issued; unreadable values count as absent
pub fn load_sequence(backend: &dyn Backend, key: &str) -> std::result::Result<Option<TaskId>, BackendError> {
    let seq_key = sequence_key(key);
    let Some(raw) = backend.get(&seq_key)? else {
        return Ok(None);
    };
    match raw.parse::<TaskId>() {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            warn!(key = %seq_key, error = %e, "Ignoring malformed id sequence");
            Ok(None)
        }
    }
}

pub fn save_sequence(backend: &mut dyn Backend, key: &str, last_issued: TaskId) -> Result<()> {
    backend.set(&sequence_key(key), &last_issued.to_string())?;
    Ok(())
}

/// Keep valid entries in order, giving fresh ids to entries without a unique one
///
/// Fresh ids continue after the highest stored id. If that id is already
/// `u64::MAX`, they fall back to the lowest id nobody holds.
fn assign_ids(stored: Vec<StoredTask>) -> Vec<Task> {
    let now = Utc::now();
    let reserved: HashSet<TaskId> = stored.iter().filter_map(|s| s.id).collect();
    let mut seen: HashSet<TaskId> = HashSet::new();
    let mut next = match reserved.iter().max() {
        Some(max) => max.checked_next(),
        None => Some(TaskId::new(1)),
    };

    let mut tasks = Vec::with_capacity(stored.len());
    for (index, entry) in stored.into_iter().enumerate() {
        let text = entry.text.trim();
        if text.is_empty() {
            warn!(index, "Dropping stored task with empty text");
            continue;
        }

        let id = match entry.id {
            Some(id) if seen.insert(id) => id,
            _ => {
                let id = match next {
                    Some(id) => {
                        next = id.checked_next();
                        id
                    }
                    None => TaskId::lowest_unused(|id| seen.contains(&id) || reserved.contains(&id)),
                };
                seen.insert(id);
                id
            }
        };

        tasks.push(Task::from_parts(
            id,
            text.to_string(),
            entry.completed,
            entry.priority,
            entry.category,
            entry.due_date,
            entry.created_at.unwrap_or(now),
        ));
    }
    tasks
}

/// `dueDate` is a `YYYY-MM-DD` string, or `""` when unset
mod due_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = NaiveDate::parse_from_str(raw, FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));
        if parsed.is_none() {
            warn!(due_date = raw, "Ignoring unparseable due date");
        }
        parsed
    }
}
