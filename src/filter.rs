// Filtering, searching and ordering of the task list

use crate::record::{Priority, Task};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which tasks are eligible for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
    High,
}

impl FilterMode {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !task.is_completed(),
            FilterMode::Completed => task.is_completed(),
            FilterMode::High => task.priority() == Priority::High,
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::All => write!(f, "all"),
            FilterMode::Active => write!(f, "active"),
            FilterMode::Completed => write!(f, "completed"),
            FilterMode::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "active" => Ok(FilterMode::Active),
            "completed" => Ok(FilterMode::Completed),
            "high" => Ok(FilterMode::High),
            _ => Err(format!("Unknown filter: {}. Use: all, active, completed, or high", s)),
        }
    }
}

/// Where undated tasks sort relative to dated tasks of the same priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndatedPlacement {
    First,
    #[default]
    Last,
}

impl std::str::FromStr for UndatedPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(UndatedPlacement::First),
            "last" => Ok(UndatedPlacement::Last),
            _ => Err(format!("Unknown undated placement: {}. Use: first or last", s)),
        }
    }
}

/// A view request: filter mode, search text and ordering policy
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: FilterMode,
    pub search: String,
    pub undated: UndatedPlacement,
}

impl Query {
    pub fn new(filter: FilterMode) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn undated(mut self, undated: UndatedPlacement) -> Self {
        self.undated = undated;
        self
    }

    /// Compute the filtered, sorted view. Never mutates `tasks`.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let needle = self.search.to_lowercase();

        let mut view: Vec<&Task> = tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .filter(|task| needle.is_empty() || task.text().to_lowercase().contains(&needle))
            .collect();

        // Stable: equal keys keep insertion order
        view.sort_by(|a, b| compare(a, b, self.undated));
        view
    }
}

/// Shorthand for `Query::new(filter).search(search).apply(tasks)`
pub fn view<'a>(tasks: &'a [Task], filter: FilterMode, search: &str) -> Vec<&'a Task> {
    Query::new(filter).search(search).apply(tasks)
}

/// Priority descending, then due date ascending, undated per `undated`
fn compare(a: &Task, b: &Task, undated: UndatedPlacement) -> Ordering {
    b.priority().weight().cmp(&a.priority().weight()).then_with(|| {
        match (a.due_date(), b.due_date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, None) => Ordering::Equal,
            (Some(_), None) => match undated {
                UndatedPlacement::Last => Ordering::Less,
                UndatedPlacement::First => Ordering::Greater,
            },
            (None, Some(_)) => match undated {
                UndatedPlacement::Last => Ordering::Greater,
                UndatedPlacement::First => Ordering::Less,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::task;
    use crate::record::TaskId;
    use proptest::prelude::*;

    fn ids(view: &[&Task]) -> Vec<u64> {
        view.iter().map(|t| t.id().get()).collect()
    }

    fn completed(mut t: Task) -> Task {
        t.toggle();
        t
    }

    #[test]
    fn test_filter_mode_parse_and_display() {
        for mode in [FilterMode::All, FilterMode::Active, FilterMode::Completed, FilterMode::High] {
            assert_eq!(mode.to_string().parse::<FilterMode>().unwrap(), mode);
        }
        assert_eq!("ACTIVE".parse::<FilterMode>().unwrap(), FilterMode::Active);
        assert!("done".parse::<FilterMode>().is_err());
    }

    #[test]
    fn test_sort_by_priority() {
        let tasks = vec![
            task(1, "low", Priority::Low, None),
            task(2, "high", Priority::High, None),
            task(3, "medium", Priority::Medium, None),
        ];

        let result = view(&tasks, FilterMode::All, "");
        let priorities: Vec<Priority> = result.iter().map(|t| t.priority()).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn test_sort_earlier_due_first() {
        let tasks = vec![
            task(1, "later", Priority::Medium, Some("2024-06-01")),
            task(2, "sooner", Priority::Medium, Some("2024-05-01")),
        ];
        assert_eq!(ids(&view(&tasks, FilterMode::All, "")), vec![2, 1]);
    }

    #[test]
    fn test_undated_keep_relative_order() {
        let tasks = vec![
            task(1, "c", Priority::Low, None),
            task(2, "a", Priority::Low, None),
            task(3, "b", Priority::Low, None),
        ];
        assert_eq!(ids(&view(&tasks, FilterMode::All, "")), vec![1, 2, 3]);
    }

    #[test]
    fn test_undated_placement_policy() {
        let tasks = vec![
            task(1, "undated", Priority::Medium, None),
            task(2, "dated", Priority::Medium, Some("2024-05-01")),
            task(3, "undated too", Priority::Medium, None),
            task(4, "urgent undated", Priority::High, None),
        ];

        let last = Query::new(FilterMode::All).apply(&tasks);
        assert_eq!(ids(&last), vec![4, 2, 1, 3]);

        let first = Query::new(FilterMode::All).undated(UndatedPlacement::First).apply(&tasks);
        assert_eq!(ids(&first), vec![4, 1, 3, 2]);
    }

    #[test]
    fn test_priority_beats_due_date() {
        let tasks = vec![
            task(1, "low but due soon", Priority::Low, Some("2020-01-01")),
            task(2, "high undated", Priority::High, None),
        ];
        assert_eq!(ids(&view(&tasks, FilterMode::All, "")), vec![2, 1]);
    }

    #[test]
    fn test_completed_and_active_filters() {
        let tasks = vec![
            task(1, "open", Priority::Low, None),
            completed(task(2, "done", Priority::Low, None)),
            completed(task(3, "done too", Priority::High, None)),
        ];

        let done = view(&tasks, FilterMode::Completed, "");
        assert!(done.iter().all(|t| t.is_completed()));
        assert_eq!(ids(&done), vec![3, 2]);

        let active = view(&tasks, FilterMode::Active, "");
        assert_eq!(ids(&active), vec![1]);
    }

    #[test]
    fn test_high_filter() {
        let tasks = vec![
            task(1, "a", Priority::Low, None),
            completed(task(2, "b", Priority::High, None)),
            task(3, "c", Priority::High, None),
        ];
        assert_eq!(ids(&view(&tasks, FilterMode::High, "")), vec![2, 3]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let tasks = vec![
            task(1, "Buy milk", Priority::Medium, None),
            task(2, "MILK run", Priority::Medium, None),
            task(3, "bread", Priority::Medium, None),
        ];

        assert_eq!(ids(&view(&tasks, FilterMode::All, "milk")), vec![1, 2]);
        assert_eq!(ids(&view(&tasks, FilterMode::All, "MiLk")), vec![1, 2]);
        assert_eq!(ids(&view(&tasks, FilterMode::All, "")), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_combines_with_filter() {
        let tasks = vec![
            task(1, "Buy milk", Priority::Medium, None),
            completed(task(2, "milk the cow", Priority::Medium, None)),
        ];
        assert_eq!(ids(&view(&tasks, FilterMode::Active, "milk")), vec![1]);
        assert_eq!(ids(&view(&tasks, FilterMode::Completed, "milk")), vec![2]);
    }

    fn arb_task() -> impl Strategy<Value = (u8, bool, Option<u32>)> {
        (0u8..3, any::<bool>(), proptest::option::of(0u32..60))
    }

    fn build(specs: &[(u8, bool, Option<u32>)]) -> Vec<Task> {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        specs
            .iter()
            .enumerate()
            .map(|(i, (p, done, due))| {
                let priority = match p {
                    0 => Priority::Low,
                    1 => Priority::Medium,
                    _ => Priority::High,
                };
                let mut t = Task::from_parts(
                    TaskId::new(i as u64 + 1),
                    format!("task {}", i),
                    false,
                    priority,
                    "personal".to_string(),
                    due.map(|d| base + chrono::Duration::days(d as i64)),
                    chrono::Utc::now(),
                );
                if *done {
                    t.toggle();
                }
                t
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_active_and_completed_partition(specs in proptest::collection::vec(arb_task(), 0..40)) {
            let tasks = build(&specs);
            let mut split: Vec<u64> = ids(&view(&tasks, FilterMode::Active, ""));
            split.extend(ids(&view(&tasks, FilterMode::Completed, "")));
            split.sort();
            let mut all = ids(&view(&tasks, FilterMode::All, ""));
            all.sort();
            prop_assert_eq!(split, all);
        }

        #[test]
        fn prop_view_is_ordered_and_pure(specs in proptest::collection::vec(arb_task(), 0..40)) {
            let tasks = build(&specs);
            let before = tasks.clone();
            let first = ids(&view(&tasks, FilterMode::All, ""));
            let second = view(&tasks, FilterMode::All, "");

            prop_assert_eq!(&tasks, &before);
            prop_assert_eq!(&first, &ids(&second));
            for pair in second.windows(2) {
                prop_assert_ne!(compare(pair[0], pair[1], UndatedPlacement::Last), Ordering::Greater);
            }
        }
    }
}
