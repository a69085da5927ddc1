//! tasklist - CLI entry point

use std::io::{self, BufRead, Write};

use chrono::{Local, NaiveDate};
use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use tasklist::cli::{Cli, Command, OutputFormat, join_text};
use tasklist::config::Config;
use tasklist::{persist, render};
use tasklist::{NewTask, Query, RemoveOutcome, StoreError, TaskStore};

fn setup_logging(verbose: bool) {
    // Logs go to stderr so list output stays clean
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.store_path {
        config.storage.dir = dir;
    }
    info!(
        "Using {:?} store at {} (key: {})",
        config.storage.backend,
        config.storage.dir.display(),
        config.storage.key
    );

    let backend = config.storage.open_backend()?;
    let mut store = TaskStore::open(backend, config.storage.key.clone()).context("Failed to open task store")?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Add {
            text,
            priority,
            category,
            due,
        } => {
            let mut new = NewTask::new(join_text(&text))
                .priority(priority.unwrap_or(config.defaults.priority))
                .category(category.unwrap_or_else(|| config.defaults.category.clone()));
            if let Some(due) = due {
                new = new.due(due);
            }
            // Blank text is rejected without a message
            if let Some(id) = store.add(new)? {
                println!("Added task {}", id);
            }
        }
        Command::List { filter, query, format } => {
            let query = Query::new(filter).search(query).undated(config.view.undated);
            cmd_list(&store, &query, format, today)?;
        }
        Command::Toggle { id } => {
            if let Some(completed) = notice_if_missing(store.toggle_completed(id))? {
                let state = if completed { "completed" } else { "active" };
                println!("Task {} marked {}", id, state);
            }
        }
        Command::Edit { id, text } => match notice_if_missing(store.edit_text(id, &join_text(&text)))? {
            Some(true) => println!("Updated task {}", id),
            Some(false) => println!("Task {} unchanged", id),
            None => {}
        },
        Command::Rm { id } => {
            if let Some(removed) = notice_if_missing(store.remove(id))? {
                println!("Deleted task {}: {}", id, removed.text());
            }
        }
        Command::Clear { yes } => cmd_clear(&mut store, yes)?,
        Command::ClearCompleted { yes } => cmd_clear_completed(&mut store, yes)?,
        Command::Stats { format } => {
            let stats = store.stats(today);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Text => println!("{}", render::render_stats(&stats)),
            }
        }
    }

    Ok(())
}

fn cmd_list(store: &TaskStore, query: &Query, format: OutputFormat, today: NaiveDate) -> Result<()> {
    let view = store.view(query);
    match format {
        OutputFormat::Json => println!("{}", persist::to_json_pretty(&view)?),
        OutputFormat::Text => println!("{}", render::render_view(&view, &store.stats(today), today)),
    }
    Ok(())
}

fn cmd_clear(store: &mut TaskStore, yes: bool) -> Result<()> {
    if store.count() == 0 {
        println!("No tasks to delete!");
        return Ok(());
    }
    if !yes && !confirm("Are you sure you want to delete all tasks?")? {
        println!("Cancelled");
        return Ok(());
    }
    let removed = store.remove_all()?;
    println!("Deleted {} task(s)", removed);
    Ok(())
}

fn cmd_clear_completed(store: &mut TaskStore, yes: bool) -> Result<()> {
    let count = store.completed_count();
    if count == 0 {
        println!("No completed tasks to delete!");
        return Ok(());
    }
    if !yes && !confirm(&format!("Delete {} completed task(s)?", count))? {
        println!("Cancelled");
        return Ok(());
    }
    match store.remove_completed()? {
        RemoveOutcome::Removed(n) => println!("Deleted {} completed task(s)", n),
        RemoveOutcome::NothingToDelete => println!("No completed tasks to delete!"),
    }
    Ok(())
}

/// Unknown ids are reported and skipped; other errors propagate
fn notice_if_missing<T>(result: tasklist::error::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound(id)) => {
            warn!(id = %id, "Task not found");
            eprintln!("No task with id {}", id);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Ask a yes/no question on stdin; anything but y/yes is a no
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
