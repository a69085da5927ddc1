// Task record and its metadata types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default category for tasks added without one
pub const DEFAULT_CATEGORY: &str = "personal";

/// Stable task identifier, assigned once at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The following id, or `None` once the counter is exhausted
    pub(crate) fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Smallest id for which `taken` is false
    pub(crate) fn lowest_unused(taken: impl Fn(TaskId) -> bool) -> Self {
        (1..=u64::MAX)
            .map(Self)
            .find(|id| !taken(*id))
            .unwrap_or(Self(0))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| format!("Invalid task id: {}", s))
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort weight: high=3, medium=2, low=1
    pub fn weight(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown priority: {}. Use: high, medium, or low", s)),
        }
    }
}

/// Input for `TaskStore::add`
#[derive(Debug, Clone)]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: Priority::default(),
            category: DEFAULT_CATEGORY.to_string(),
            due_date: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// A single to-do entry
///
/// Fields are private so that the text stays non-empty and `created_at`
/// stays fixed; mutation goes through `TaskStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    text: String,
    completed: bool,
    priority: Priority,
    category: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl Task {
    /// Build a task from already-validated parts; `text` must be trimmed and non-empty
    pub(crate) fn from_parts(
        id: TaskId,
        text: String,
        completed: bool,
        priority: Priority,
        category: String,
        due_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(!text.trim().is_empty());
        Self {
            id,
            text,
            completed,
            priority,
            category,
            due_date,
            created_at,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Due strictly before `today` and still open
    ///
    /// Compares calendar days, not instants: a task due today only becomes
    /// overdue tomorrow, whatever the time of day or timezone.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    pub(crate) fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Replace the text if `text` is non-blank; returns whether it changed
    pub(crate) fn set_text(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.text = trimmed.to_string();
        true
    }
}
