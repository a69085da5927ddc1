//! CLI command definitions and subcommands

use crate::filter::FilterMode;
use crate::record::{Priority, TaskId};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tasklist - personal task list manager
#[derive(Parser)]
#[command(
    name = "tasklist",
    about = "Add, complete, filter and search short tasks with priority, category and due dates",
    version = env!("GIT_DESCRIBE")
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides storage.dir from config)
    #[arg(short, long, global = true)]
    pub store_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// Task text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Priority: high, medium, or low
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Category label
        #[arg(long)]
        category: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_due_date)]
        due: Option<NaiveDate>,
    },

    /// Show tasks
    List {
        /// Filter: all, active, completed, or high
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,

        /// Case-insensitive text search
        #[arg(short, long, default_value = "")]
        query: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark a task done, or open again
    Toggle {
        id: TaskId,
    },

    /// Replace a task's text
    Edit {
        id: TaskId,

        /// New text; blank leaves the task unchanged
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a task
    Rm {
        id: TaskId,
    },

    /// Delete all tasks
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete completed tasks
    ClearCompleted {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show task counters
    Stats {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for list/stats
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

fn parse_due_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| format!("Invalid date: {}. Use YYYY-MM-DD", s))
}

/// Join multi-word text arguments
pub fn join_text(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_add() {
        let cli = Cli::parse_from(["tasklist", "add", "Buy", "milk", "-p", "high", "--category", "shopping", "-d", "2024-02-01"]);
        match cli.command {
            Command::Add {
                text,
                priority,
                category,
                due,
            } => {
                assert_eq!(join_text(&text), "Buy milk");
                assert_eq!(priority, Some(Priority::High));
                assert_eq!(category.as_deref(), Some("shopping"));
                assert_eq!(due, NaiveDate::from_ymd_opt(2024, 2, 1));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_cli_parse_add_bad_date() {
        assert!(Cli::try_parse_from(["tasklist", "add", "x", "-d", "next week"]).is_err());
    }

    #[test]
    fn test_cli_parse_list_defaults() {
        let cli = Cli::parse_from(["tasklist", "list"]);
        assert!(matches!(
            cli.command,
            Command::List {
                filter: FilterMode::All,
                format: OutputFormat::Text,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_list_options() {
        let cli = Cli::parse_from(["tasklist", "list", "-f", "completed", "-q", "milk", "--format", "json"]);
        match cli.command {
            Command::List { filter, query, format } => {
                assert_eq!(filter, FilterMode::Completed);
                assert_eq!(query, "milk");
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::parse_from(["tasklist", "toggle", "3", "-s", "/tmp/x", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.store_path, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Command::Toggle { id } if id == TaskId::new(3)));
    }

    #[test]
    fn test_cli_parse_clear_completed_yes() {
        let cli = Cli::parse_from(["tasklist", "clear-completed", "-y"]);
        assert!(matches!(cli.command, Command::ClearCompleted { yes: true }));
    }

    #[test]
    fn test_cli_rejects_bad_id_and_filter() {
        assert!(Cli::try_parse_from(["tasklist", "rm", "abc"]).is_err());
        assert!(Cli::try_parse_from(["tasklist", "list", "-f", "done"]).is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("PLAIN".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
