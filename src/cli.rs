use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::database::{Database, DatabaseError, TaskUpdate};
use crate::models::{Goal, Task, TaskFilter};
use crate::ranking::filter_tasks;
use crate::search::SearchQuery;
use crate::validation::{self, ValidationError};

#[derive(Parser)]
#[command(name = "goalpost")]
#[command(about = "Track learning goals and the tasks that get you there")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (separate config and database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Create a learning goal
    AddGoal {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        /// active, paused or cancelled
        #[arg(long)]
        status: Option<String>,
    },
    /// Change a goal's details
    EditGoal {
        slug: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
        /// active, completed, paused or cancelled
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a goal and all of its tasks
    DeleteGoal { slug: String },
    /// List goals with their progress
    Goals,
    /// Show a goal and its tasks in priority order
    Show {
        slug: String,
        /// all, pending or completed
        #[arg(long)]
        filter: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a task to a goal
    AddTask {
        /// Goal slug
        goal: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// Change a task's details
    EditTask {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },
    /// Flip a task between done and not done
    Toggle { id: i64 },
    /// Mark a task done
    Done { id: i64 },
    /// Mark a task not done
    Undone { id: i64 },
    /// Delete a task
    DeleteTask { id: i64 },
    /// Search goals and tasks
    Search {
        query: String,
        /// Maximum results (1-50)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    ValidationError(#[from] ValidationError),
    #[error("Failed to encode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),
}

/// Settings from config that shape command output
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub today: NaiveDate,
    pub due_soon_days: i64,
    pub default_filter: TaskFilter,
}

#[derive(Serialize)]
struct GoalDetails<'a> {
    goal: &'a Goal,
    filter: TaskFilter,
    tasks: &'a [Task],
}

/// One-line goal summary: progress, slug, title, status
pub fn format_goal_line(goal: &Goal) -> String {
    format!("[{:>3}%] {}  {} ({})", goal.progress, goal.slug, goal.title, goal.status)
}

/// One-line task summary with overdue / due-soon markers
pub fn format_task_line(task: &Task, options: &OutputOptions) -> String {
    let check = if task.completed { "x" } else { " " };
    let mut line = format!(
        "#{} [{}] ({}) {}",
        task.id.unwrap_or_default(),
        check,
        task.priority.label(),
        task.title
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due));
    }
    if task.is_overdue(options.today) {
        line.push_str("  OVERDUE");
    } else if task.is_due_soon(options.today, options.due_soon_days) {
        line.push_str("  due soon");
    }
    line
}

fn write_goal_summary(out: &mut dyn Write, goal: &Goal) -> Result<(), CliError> {
    writeln!(out, "Goal '{}' is now {}% ({})", goal.slug, goal.progress, goal.status)?;
    Ok(())
}

fn write_task_update(out: &mut dyn Write, verb: &str, update: &TaskUpdate) -> Result<(), CliError> {
    writeln!(out, "Task {} (ID: {})", verb, update.task.id.unwrap_or_default())?;
    write_goal_summary(out, &update.goal)
}

/// Dispatch every subcommand except `tui`
pub fn run_command(
    command: Commands,
    db: &Database,
    options: &OutputOptions,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Commands::Tui => Ok(()),
        Commands::AddGoal { title, description, tags, deadline, status } => {
            handle_add_goal(title, description, tags, deadline, status, db, out)
        }
        Commands::EditGoal { slug, title, description, tags, deadline, clear_deadline, status } => {
            let edit = GoalEdit { title, description, tags, deadline, clear_deadline, status };
            handle_edit_goal(&slug, edit, db, out)
        }
        Commands::DeleteGoal { slug } => handle_delete_goal(&slug, db, out),
        Commands::Goals => handle_list_goals(db, out),
        Commands::Show { slug, filter, json } => handle_show(&slug, filter, json, db, options, out),
        Commands::AddTask { goal, title, description, priority, due } => {
            handle_add_task(&goal, title, description, priority, due, db, out)
        }
        Commands::EditTask { id, title, description, priority, due, clear_due } => {
            let edit = TaskEdit { title, description, priority, due, clear_due };
            handle_edit_task(id, edit, db, out)
        }
        Commands::Toggle { id } => {
            let update = db.toggle_task(id)?;
            let verb = if update.task.completed { "completed" } else { "reopened" };
            write_task_update(out, verb, &update)
        }
        Commands::Done { id } => write_task_update(out, "completed", &db.set_task_completed(id, true)?),
        Commands::Undone { id } => write_task_update(out, "reopened", &db.set_task_completed(id, false)?),
        Commands::DeleteTask { id } => {
            let goal = db.delete_task(id)?;
            writeln!(out, "Task deleted (ID: {})", id)?;
            write_goal_summary(out, &goal)
        }
        Commands::Search { query, limit } => handle_search(&query, limit, db, options, out),
    }
}

/// Handle the add-goal command
pub fn handle_add_goal(
    title: String,
    description: Option<String>,
    tags: Option<String>,
    deadline: Option<String>,
    status: Option<String>,
    db: &Database,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let title = validation::goal_title(&title)?;
    let mut goal = Goal::new(title, String::new());
    goal.description = validation::optional_text(description.as_deref());
    goal.tags = tags.as_deref().map(validation::tags).unwrap_or_default();
    goal.deadline = validation::optional_date("deadline", deadline.as_deref())?;
    if let Some(status) = status {
        goal.status = validation::status(&status)?;
    }

    let stored = db.create_goal(&goal)?;
    writeln!(out, "Goal created: {} (slug: {})", stored.title, stored.slug)?;
    Ok(())
}

/// Optional changes to a goal; `None` leaves a field as it is
#[derive(Debug, Default)]
pub struct GoalEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
    pub status: Option<String>,
}

/// Handle the edit-goal command
pub fn handle_edit_goal(slug: &str, edit: GoalEdit, db: &Database, out: &mut dyn Write) -> Result<(), CliError> {
    let mut goal = db.get_goal_by_slug(slug)?;

    if let Some(title) = edit.title {
        goal.title = validation::goal_title(&title)?;
    }
    if let Some(description) = edit.description {
        goal.description = validation::optional_text(Some(&description));
    }
    if let Some(tags) = edit.tags {
        goal.tags = validation::tags(&tags);
    }
    if edit.clear_deadline {
        goal.deadline = None;
    } else if let Some(deadline) = edit.deadline {
        goal.deadline = Some(validation::date("deadline", &deadline)?);
    }
    if let Some(status) = edit.status {
        goal.status = validation::status(&status)?;
    }

    let stored = db.update_goal(&goal)?;
    writeln!(out, "Goal updated: {} (slug: {})", stored.title, stored.slug)?;
    write_goal_summary(out, &stored)
}

/// Handle the delete-goal command
pub fn handle_delete_goal(slug: &str, db: &Database, out: &mut dyn Write) -> Result<(), CliError> {
    let goal = db.get_goal_by_slug(slug)?;
    if let Some(id) = goal.id {
        db.delete_goal(id)?;
    }
    writeln!(out, "Goal deleted: {}", goal.title)?;
    Ok(())
}

/// Handle the goals command
pub fn handle_list_goals(db: &Database, out: &mut dyn Write) -> Result<(), CliError> {
    let goals = db.get_all_goals()?;
    if goals.is_empty() {
        writeln!(out, "No goals yet. Create one with `goalpost add-goal <title>`.")?;
    }
    for goal in &goals {
        writeln!(out, "{}", format_goal_line(goal))?;
    }
    Ok(())
}

/// Handle the show command
pub fn handle_show(
    slug: &str,
    filter: Option<String>,
    json: bool,
    db: &Database,
    options: &OutputOptions,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let filter = match filter {
        Some(f) => f.parse::<TaskFilter>().map_err(ValidationError::from)?,
        None => options.default_filter,
    };
    let goal = db.get_goal_by_slug(slug)?;
    let tasks = db.get_tasks_for_goal(goal.id.unwrap_or_default())?;
    let total = tasks.len();
    let done = tasks.iter().filter(|t| t.completed).count();
    let visible = filter_tasks(&tasks, filter);
    debug!(slug, ?filter, shown = visible.len(), "showing goal");

    if json {
        let details = GoalDetails { goal: &goal, filter, tasks: &visible };
        writeln!(out, "{}", serde_json::to_string_pretty(&details)?)?;
        return Ok(());
    }

    writeln!(out, "{}", goal.title)?;
    writeln!(out, "  slug:     {}", goal.slug)?;
    writeln!(out, "  status:   {}", goal.status)?;
    writeln!(out, "  progress: {}% ({} of {} tasks completed)", goal.progress, done, total)?;
    if let Some(deadline) = goal.deadline {
        writeln!(out, "  deadline: {}", deadline)?;
    }
    if !goal.tags.is_empty() {
        writeln!(out, "  tags:     {}", goal.tags_string())?;
    }
    if let Some(ref description) = goal.description {
        writeln!(out, "\n{}", description)?;
    }

    writeln!(out, "\nTasks ({}):", filter.label())?;
    if visible.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for task in &visible {
        writeln!(out, "  {}", format_task_line(task, options))?;
    }
    Ok(())
}

/// Handle the add-task command
pub fn handle_add_task(
    goal_slug: &str,
    title: String,
    description: Option<String>,
    priority: Option<String>,
    due: Option<String>,
    db: &Database,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let goal = db.get_goal_by_slug(goal_slug)?;
    let mut task = Task::new(goal.id.unwrap_or_default(), validation::task_title(&title)?);
    task.description = validation::optional_text(description.as_deref());
    if let Some(priority) = priority {
        task.priority = validation::priority(&priority)?;
    }
    task.due_date = validation::optional_date("due date", due.as_deref())?;

    let update = db.create_task(&task)?;
    write_task_update(out, "created", &update)
}

/// Optional changes to a task; `None` leaves a field as it is
#[derive(Debug, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
}

/// Handle the edit-task command
pub fn handle_edit_task(id: i64, edit: TaskEdit, db: &Database, out: &mut dyn Write) -> Result<(), CliError> {
    let mut task = db.get_task(id)?;

    if let Some(title) = edit.title {
        task.title = validation::task_title(&title)?;
    }
    if let Some(description) = edit.description {
        task.description = validation::optional_text(Some(&description));
    }
    if let Some(priority) = edit.priority {
        task.priority = validation::priority(&priority)?;
    }
    if edit.clear_due {
        task.due_date = None;
    } else if let Some(due) = edit.due {
        task.due_date = Some(validation::date("due date", &due)?);
    }

    let update = db.update_task(&task)?;
    write_task_update(out, "updated", &update)
}

/// Handle the search command
pub fn handle_search(
    query: &str,
    limit: Option<usize>,
    db: &Database,
    options: &OutputOptions,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let query = SearchQuery::new(query, limit)?;
    let results = db.search(&query)?;

    if results.is_empty() {
        writeln!(out, "No results found")?;
        return Ok(());
    }
    if !results.goals.is_empty() {
        writeln!(out, "Goals:")?;
        for goal in &results.goals {
            writeln!(out, "  {}", format_goal_line(goal))?;
        }
    }
    if !results.tasks.is_empty() {
        writeln!(out, "Tasks:")?;
        for hit in &results.tasks {
            writeln!(out, "  {}  [{}]", format_task_line(&hit.task, options), hit.goal_slug)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GoalStatus;

    fn options() -> OutputOptions {
        OutputOptions {
            today: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            due_soon_days: 3,
            default_filter: TaskFilter::All,
        }
    }

    fn run(db: &Database, command: Commands) -> Result<String, CliError> {
        let mut out = Vec::new();
        run_command(command, db, &options(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn add_goal(db: &Database, title: &str) {
        run(
            db,
            Commands::AddGoal {
                title: title.to_string(),
                description: None,
                tags: Some("rust, systems".to_string()),
                deadline: None,
                status: None,
            },
        )
        .unwrap();
    }

    fn add_task(db: &Database, goal: &str, title: &str, priority: &str, due: Option<&str>) -> String {
        run(
            db,
            Commands::AddTask {
                goal: goal.to_string(),
                title: title.to_string(),
                description: None,
                priority: Some(priority.to_string()),
                due: due.map(str::to_string),
            },
        )
        .unwrap()
    }

    #[test]
    fn add_goal_and_tasks_reports_progress() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        let goal = db.get_goal_by_slug("learn-rust").unwrap();
        assert_eq!(goal.tags, vec!["rust", "systems"]);

        let output = add_task(&db, "learn-rust", "Read the book", "high", None);
        assert!(output.contains("Task created"));
        assert!(output.contains("is now 0% (active)"));

        let task_id = db.get_tasks_for_goal(goal.id.unwrap()).unwrap()[0].id.unwrap();
        let output = run(&db, Commands::Done { id: task_id }).unwrap();
        assert!(output.contains("is now 100% (completed)"));

        let output = run(&db, Commands::Toggle { id: task_id }).unwrap();
        assert!(output.contains("reopened"));
        assert!(output.contains("is now 0% (active)"));
    }

    #[test]
    fn show_lists_ranked_tasks_with_markers() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        add_task(&db, "learn-rust", "Someday", "low", None);
        add_task(&db, "learn-rust", "Late", "medium", Some("2026-03-01"));
        add_task(&db, "learn-rust", "Soon", "medium", Some("2026-03-12"));

        let output = run(
            &db,
            Commands::Show { slug: "learn-rust".to_string(), filter: None, json: false },
        )
        .unwrap();
        let late = output.find("Late").unwrap();
        let soon = output.find("Soon").unwrap();
        let someday = output.find("Someday").unwrap();
        assert!(late < soon && soon < someday);
        assert!(output.contains("OVERDUE"));
        assert!(output.contains("due soon"));
        assert!(output.contains("0 of 3 tasks completed"));
    }

    #[test]
    fn show_json_respects_filter() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        add_task(&db, "learn-rust", "One", "low", None);
        add_task(&db, "learn-rust", "Two", "low", None);
        let goal = db.get_goal_by_slug("learn-rust").unwrap();
        let first = db.get_tasks_for_goal(goal.id.unwrap()).unwrap()[0].id.unwrap();
        db.set_task_completed(first, true).unwrap();

        let output = run(
            &db,
            Commands::Show {
                slug: "learn-rust".to_string(),
                filter: Some("pending".to_string()),
                json: true,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["filter"], "pending");
        assert_eq!(value["goal"]["progress"], 50);
        assert_eq!(value["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(value["tasks"][0]["title"], "Two");
    }

    #[test]
    fn invalid_input_is_rejected_before_writing() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");

        let bad_priority = run(
            &db,
            Commands::AddTask {
                goal: "learn-rust".to_string(),
                title: "x".to_string(),
                description: None,
                priority: Some("urgent".to_string()),
                due: None,
            },
        );
        assert!(matches!(bad_priority, Err(CliError::ValidationError(_))));

        let bad_date = run(
            &db,
            Commands::AddTask {
                goal: "learn-rust".to_string(),
                title: "x".to_string(),
                description: None,
                priority: None,
                due: Some("tomorrow".to_string()),
            },
        );
        assert!(matches!(bad_date, Err(CliError::ValidationError(_))));

        let blank = run(
            &db,
            Commands::AddGoal {
                title: "  ".to_string(),
                description: None,
                tags: None,
                deadline: None,
                status: None,
            },
        );
        assert!(matches!(blank, Err(CliError::ValidationError(_))));

        let goal = db.get_goal_by_slug("learn-rust").unwrap();
        assert!(db.get_tasks_for_goal(goal.id.unwrap()).unwrap().is_empty());
    }

    #[test]
    fn edit_goal_changes_slug_and_status() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        let output = run(
            &db,
            Commands::EditGoal {
                slug: "learn-rust".to_string(),
                title: Some("Master Rust".to_string()),
                description: None,
                tags: None,
                deadline: Some("2026-12-31".to_string()),
                clear_deadline: false,
                status: Some("paused".to_string()),
            },
        )
        .unwrap();
        assert!(output.contains("slug: master-rust"));
        let goal = db.get_goal_by_slug("master-rust").unwrap();
        assert_eq!(goal.status, GoalStatus::Paused);
        assert!(goal.deadline.is_some());
    }

    #[test]
    fn edit_task_clears_due_date() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        add_task(&db, "learn-rust", "Dated", "low", Some("2026-04-01"));
        let goal = db.get_goal_by_slug("learn-rust").unwrap();
        let id = db.get_tasks_for_goal(goal.id.unwrap()).unwrap()[0].id.unwrap();

        let edit = TaskEdit { clear_due: true, priority: Some("high".to_string()), ..TaskEdit::default() };
        let mut out = Vec::new();
        handle_edit_task(id, edit, &db, &mut out).unwrap();

        let task = db.get_task(id).unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, crate::models::Priority::High);
    }

    #[test]
    fn search_and_delete() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        add_task(&db, "learn-rust", "Borrow checker drills", "high", None);

        let output = run(&db, Commands::Search { query: "borrow".to_string(), limit: None }).unwrap();
        assert!(output.contains("Borrow checker drills"));
        assert!(output.contains("[learn-rust]"));

        run(&db, Commands::DeleteGoal { slug: "learn-rust".to_string() }).unwrap();
        let output = run(&db, Commands::Search { query: "borrow".to_string(), limit: None }).unwrap();
        assert!(output.contains("No results found"));
        let output = run(&db, Commands::Goals).unwrap();
        assert!(output.contains("No goals yet"));
    }

    #[test]
    fn edit_goal_cannot_complete_unfinished_goal() {
        let db = Database::open_in_memory().unwrap();
        add_goal(&db, "Learn Rust");
        add_task(&db, "learn-rust", "Ownership", "high", None);
        let edit = GoalEdit { status: Some("completed".to_string()), ..GoalEdit::default() };
        let mut out = Vec::new();
        handle_edit_goal("learn-rust", edit, &db, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("is now 0% (active)"));
        assert_eq!(db.get_goal_by_slug("learn-rust").unwrap().status, GoalStatus::Active);
    }
}
