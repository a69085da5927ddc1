//! Text rendering of task views for the terminal

use crate::record::{Priority, Task};
use crate::store::Stats;
use chrono::NaiveDate;
use colored::{ColoredString, Colorize};

/// Format a due date relative to `today`: "Today", "Tomorrow", or e.g. "Jan 5"
pub fn format_due(due: NaiveDate, today: NaiveDate) -> String {
    if due == today {
        "Today".to_string()
    } else if today.succ_opt() == Some(due) {
        "Tomorrow".to_string()
    } else {
        due.format("%b %-d").to_string()
    }
}

fn priority_badge(priority: Priority) -> ColoredString {
    let label = priority.to_string();
    match priority {
        Priority::High => label.red().bold(),
        Priority::Medium => label.yellow(),
        Priority::Low => label.green(),
    }
}

/// One line per task, addressed by its stable id
pub fn render_row(task: &Task, today: NaiveDate) -> String {
    let overdue = task.is_overdue(today);
    let checkbox = if task.is_completed() { "[x]" } else { "[ ]" };

    let text = if task.is_completed() {
        task.text().dimmed().strikethrough()
    } else if overdue {
        task.text().red()
    } else {
        task.text().normal()
    };

    let mut row = format!(
        "{} {:>3}  {}  {}  {}",
        checkbox,
        task.id(),
        text,
        priority_badge(task.priority()),
        task.category().cyan()
    );

    if let Some(due) = task.due_date() {
        let label = format_due(due, today);
        if overdue {
            row.push_str(&format!("  {}  {}", label.red(), "(overdue)".red().bold()));
        } else {
            row.push_str(&format!("  {}", label));
        }
    }
    row
}

/// Counter line shown under the list
pub fn render_counters(stats: &Stats) -> String {
    format!("{} tasks, {} completed", stats.total, stats.completed)
}

pub fn render_stats(stats: &Stats) -> String {
    format!(
        "Total: {}\nActive: {}\nCompleted: {}\nOverdue: {}",
        stats.total, stats.active, stats.completed, stats.overdue
    )
}

/// Full list output; an empty view prints a placeholder
pub fn render_view(view: &[&Task], stats: &Stats, today: NaiveDate) -> String {
    let mut out = String::new();
    if view.is_empty() {
        out.push_str("No tasks to show\n");
    }
    for task in view {
        out.push_str(&render_row(task, today));
        out.push('\n');
    }
    out.push_str(&render_counters(stats));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::task;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_format_due() {
        let today = date("2024-01-31");
        assert_eq!(format_due(today, today), "Today");
        assert_eq!(format_due(date("2024-02-01"), today), "Tomorrow");
        assert_eq!(format_due(date("2024-02-05"), today), "Feb 5");
        assert_eq!(format_due(date("2023-12-25"), today), "Dec 25");
    }

    #[test]
    fn test_render_row_shows_metadata() {
        let t = task(12, "Buy milk", Priority::High, Some("2024-02-01"));
        let row = render_row(&t, date("2024-01-31"));
        assert!(row.starts_with("[ ]"));
        assert!(row.contains("12"));
        assert!(row.contains("Buy milk"));
        assert!(row.contains("high"));
        assert!(row.contains("personal"));
        assert!(row.contains("Tomorrow"));
        assert!(!row.contains("overdue"));
    }

    #[test]
    fn test_render_row_overdue() {
        let t = task(1, "File taxes", Priority::Low, Some("2024-01-01"));
        let row = render_row(&t, date("2024-01-31"));
        assert!(row.contains("(overdue)"));
        assert!(row.contains("Jan 1"));
    }

    #[test]
    fn test_render_row_completed_never_overdue() {
        let mut t = task(1, "File taxes", Priority::Low, Some("2024-01-01"));
        t.toggle();
        let row = render_row(&t, date("2024-01-31"));
        assert!(row.starts_with("[x]"));
        assert!(!row.contains("overdue"));
    }

    #[test]
    fn test_render_view_empty() {
        let out = render_view(&[], &Stats::default(), date("2024-01-31"));
        assert!(out.contains("No tasks to show"));
        assert!(out.ends_with("0 tasks, 0 completed"));
    }
}
