use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Goal, GoalStatus, Priority, Task, now_timestamp};
use crate::progress::compute_progress;
use crate::ranking::rank_tasks_in_place;
use crate::search::{SearchQuery, SearchResults, TaskHit};
use crate::slug::generate_unique_slug;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("{0} has not been saved yet")]
    Unsaved(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to encode tags: {0}")]
    TagEncoding(#[from] serde_json::Error),
}

/// A task as written, plus its goal after progress was recomputed
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub task: Task,
    pub goal: Goal,
}

const GOAL_COLUMNS: &str =
    "id, title, slug, description, tags, deadline, progress, status, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, goal_id, title, description, completed, priority, due_date, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        debug!(path = %db_path.display(), "opened database");

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Throwaway database, mostly for tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// SQLite's `lower()` and `LIKE` only fold ASCII, so search lowercases
    /// through Rust instead
    fn register_functions(&self) -> Result<(), DatabaseError> {
        self.conn.create_scalar_function(
            "lower_unicode",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )?;
        Ok(())
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.register_functions()?;

        // Cascading goal deletes depend on this
        self.conn.pragma_update(None, "foreign_keys", true)?;

        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS goals (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                slug            TEXT NOT NULL UNIQUE,
                description     TEXT,
                tags            TEXT NOT NULL DEFAULT '[]',
                deadline        TEXT,
                progress        INTEGER NOT NULL DEFAULT 0,
                status          TEXT NOT NULL DEFAULT 'active',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                goal_id         INTEGER NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                description     TEXT,
                completed       INTEGER NOT NULL DEFAULT 0,
                priority        TEXT NOT NULL DEFAULT 'medium',
                due_date        TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_goal_id ON tasks(goal_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);
            CREATE INDEX IF NOT EXISTS idx_tasks_title ON tasks(title);
            CREATE INDEX IF NOT EXISTS idx_goals_title ON goals(title);",
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn row_to_goal(row: &rusqlite::Row) -> Result<Goal, rusqlite::Error> {
        let tags_json: String = row.get(4)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        let status: String = row.get(7)?;
        let status: GoalStatus = status
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        Ok(Goal {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            tags,
            deadline: row.get(5)?,
            progress: row.get(6)?,
            status,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        let priority: String = row.get(5)?;
        Ok(Task {
            id: Some(row.get(0)?),
            goal_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            completed: row.get(4)?,
            priority: Priority::from_stored(&priority),
            due_date: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn fetch_goal(conn: &Connection, id: i64) -> Result<Goal, DatabaseError> {
        conn.query_row(
            &format!("SELECT {} FROM goals WHERE id = ?1", GOAL_COLUMNS),
            rusqlite::params![id],
            Self::row_to_goal,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            kind: "Goal",
            key: id.to_string(),
        })
    }

    fn fetch_task(conn: &Connection, id: i64) -> Result<Task, DatabaseError> {
        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            rusqlite::params![id],
            Self::row_to_task,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            kind: "Task",
            key: id.to_string(),
        })
    }

    fn fetch_tasks(conn: &Connection, goal_id: i64) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE goal_id = ?1 ORDER BY created_at ASC, id ASC",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(rusqlite::params![goal_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn slugs_except(conn: &Connection, goal_id: Option<i64>) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = conn.prepare("SELECT slug FROM goals WHERE id IS NOT ?1")?;
        let slugs = stmt
            .query_map(rusqlite::params![goal_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(slugs)
    }

    /// Recompute and persist a goal's progress from its current task set.
    /// Must run inside the transaction that mutated the tasks.
    fn refresh_goal_progress(conn: &Connection, goal_id: i64) -> Result<Goal, DatabaseError> {
        let goal = Self::fetch_goal(conn, goal_id)?;
        let tasks = Self::fetch_tasks(conn, goal_id)?;
        let computed = compute_progress(&tasks, goal.status);

        if computed.progress != goal.progress || computed.status != goal.status {
            conn.execute(
                "UPDATE goals SET progress = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
                rusqlite::params![
                    computed.progress,
                    computed.status.as_str(),
                    now_timestamp(),
                    goal_id
                ],
            )?;
            debug!(
                goal_id,
                progress = computed.progress,
                status = %computed.status,
                "goal progress recomputed"
            );
        }

        Self::fetch_goal(conn, goal_id)
    }

    /// Insert a goal under a slug unique among all goals and return it as stored
    pub fn create_goal(&self, goal: &Goal) -> Result<Goal, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = Self::slugs_except(&tx, None)?;
        let slug = generate_unique_slug(&goal.title, &existing);

        tx.execute(
            "INSERT INTO goals (title, slug, description, tags, deadline, progress, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                goal.title,
                slug,
                goal.description,
                serde_json::to_string(&goal.tags)?,
                goal.deadline,
                0,
                goal.status.as_str(),
                goal.created_at,
                goal.updated_at
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = Self::fetch_goal(&tx, id)?;
        tx.commit()?;

        info!(goal_id = id, slug = %stored.slug, "goal created");
        Ok(stored)
    }

    /// Get a single goal by ID
    pub fn get_goal(&self, id: i64) -> Result<Goal, DatabaseError> {
        Self::fetch_goal(&self.conn, id)
    }

    pub fn get_goal_by_slug(&self, slug: &str) -> Result<Goal, DatabaseError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM goals WHERE slug = ?1", GOAL_COLUMNS),
                rusqlite::params![slug],
                Self::row_to_goal,
            )
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound {
                kind: "Goal",
                key: slug.to_string(),
            })
    }

    /// Get all goals, newest first
    pub fn get_all_goals(&self) -> Result<Vec<Goal>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM goals ORDER BY created_at DESC, id DESC",
            GOAL_COLUMNS
        ))?;
        let goals = stmt
            .query_map([], Self::row_to_goal)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Update a goal's editable fields. A changed title gets a fresh slug.
    /// The requested status goes through the same policy as task changes, so
    /// a goal with unfinished tasks cannot be marked completed and a finished
    /// one cannot leave completed. Progress is recomputed, never taken from
    /// the caller.
    pub fn update_goal(&self, goal: &Goal) -> Result<Goal, DatabaseError> {
        let id = goal.id.ok_or(DatabaseError::Unsaved("Goal"))?;

        let tx = self.conn.unchecked_transaction()?;
        let existing = Self::fetch_goal(&tx, id)?;
        let slug = if existing.title != goal.title {
            let others = Self::slugs_except(&tx, Some(id))?;
            generate_unique_slug(&goal.title, &others)
        } else {
            existing.slug
        };
        let tasks = Self::fetch_tasks(&tx, id)?;
        let computed = compute_progress(&tasks, goal.status);
        if computed.status != goal.status {
            debug!(
                goal_id = id,
                requested = %goal.status,
                stored = %computed.status,
                "requested status overridden by task progress"
            );
        }

        tx.execute(
            "UPDATE goals SET title = ?1, slug = ?2, description = ?3, tags = ?4,
             deadline = ?5, progress = ?6, status = ?7, updated_at = ?8 WHERE id = ?9",
            rusqlite::params![
                goal.title,
                slug,
                goal.description,
                serde_json::to_string(&goal.tags)?,
                goal.deadline,
                computed.progress,
                computed.status.as_str(),
                now_timestamp(),
                id
            ],
        )?;
        let stored = Self::fetch_goal(&tx, id)?;
        tx.commit()?;

        info!(goal_id = id, slug = %stored.slug, "goal updated");
        Ok(stored)
    }

    /// Delete a goal by ID together with all of its tasks
    pub fn delete_goal(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM goals WHERE id = ?1", rusqlite::params![id])?;
        if removed == 0 {
            return Err(DatabaseError::NotFound {
                kind: "Goal",
                key: id.to_string(),
            });
        }
        tx.commit()?;
        info!(goal_id = id, "goal deleted");
        Ok(())
    }

    /// Insert a task and recompute its goal's progress
    pub fn create_task(&self, task: &Task) -> Result<TaskUpdate, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::fetch_goal(&tx, task.goal_id)?;

        tx.execute(
            "INSERT INTO tasks (goal_id, title, description, completed, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                task.goal_id,
                task.title,
                task.description,
                task.completed,
                task.priority.as_str(),
                task.due_date,
                task.created_at,
                task.updated_at
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = Self::fetch_task(&tx, id)?;
        let goal = Self::refresh_goal_progress(&tx, task.goal_id)?;
        tx.commit()?;

        info!(task_id = id, goal_id = task.goal_id, "task created");
        Ok(TaskUpdate { task: stored, goal })
    }

    /// Get a single task by ID
    pub fn get_task(&self, id: i64) -> Result<Task, DatabaseError> {
        Self::fetch_task(&self.conn, id)
    }

    /// All tasks of a goal in display order
    pub fn get_tasks_for_goal(&self, goal_id: i64) -> Result<Vec<Task>, DatabaseError> {
        let mut tasks = Self::fetch_tasks(&self.conn, goal_id)?;
        rank_tasks_in_place(&mut tasks);
        Ok(tasks)
    }

    /// Update a task's fields. The owning goal never changes.
    pub fn update_task(&self, task: &Task) -> Result<TaskUpdate, DatabaseError> {
        let id = task.id.ok_or(DatabaseError::Unsaved("Task"))?;

        let tx = self.conn.unchecked_transaction()?;
        let existing = Self::fetch_task(&tx, id)?;
        tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, completed = ?3, priority = ?4,
             due_date = ?5, updated_at = ?6 WHERE id = ?7",
            rusqlite::params![
                task.title,
                task.description,
                task.completed,
                task.priority.as_str(),
                task.due_date,
                now_timestamp(),
                id
            ],
        )?;
        let stored = Self::fetch_task(&tx, id)?;
        let goal = Self::refresh_goal_progress(&tx, existing.goal_id)?;
        tx.commit()?;

        info!(task_id = id, goal_id = existing.goal_id, "task updated");
        Ok(TaskUpdate { task: stored, goal })
    }

    /// Mark a task done or not done
    pub fn set_task_completed(&self, id: i64, completed: bool) -> Result<TaskUpdate, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = Self::fetch_task(&tx, id)?;
        tx.execute(
            "UPDATE tasks SET completed = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![completed, now_timestamp(), id],
        )?;
        let stored = Self::fetch_task(&tx, id)?;
        let goal = Self::refresh_goal_progress(&tx, existing.goal_id)?;
        tx.commit()?;

        info!(task_id = id, completed, goal_progress = goal.progress, "task completion set");
        Ok(TaskUpdate { task: stored, goal })
    }

    /// Flip a task's completion flag
    pub fn toggle_task(&self, id: i64) -> Result<TaskUpdate, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = Self::fetch_task(&tx, id)?;
        tx.execute(
            "UPDATE tasks SET completed = NOT completed, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now_timestamp(), id],
        )?;
        let stored = Self::fetch_task(&tx, id)?;
        let goal = Self::refresh_goal_progress(&tx, existing.goal_id)?;
        tx.commit()?;

        info!(task_id = id, completed = stored.completed, goal_progress = goal.progress, "task toggled");
        Ok(TaskUpdate { task: stored, goal })
    }

    /// Delete a task by ID and return its goal with refreshed progress
    pub fn delete_task(&self, id: i64) -> Result<Goal, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = Self::fetch_task(&tx, id)?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        let goal = Self::refresh_goal_progress(&tx, existing.goal_id)?;
        tx.commit()?;

        info!(task_id = id, goal_id = existing.goal_id, "task deleted");
        Ok(goal)
    }

    /// Case-insensitive search over goal and task text. Goals also match on
    /// an exact tag. Each kind is capped at half the query limit, rounded up.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults, DatabaseError> {
        let pattern = query.like_pattern();
        let per_kind = query.per_kind_limit() as i64;

        let mut goal_stmt = self.conn.prepare(&format!(
            "SELECT {} FROM goals
             WHERE lower_unicode(title) LIKE lower_unicode(?1) ESCAPE '\\'
                OR lower_unicode(description) LIKE lower_unicode(?1) ESCAPE '\\'
                OR EXISTS (SELECT 1 FROM json_each(goals.tags) WHERE json_each.value = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3",
            GOAL_COLUMNS
        ))?;
        let goals = goal_stmt
            .query_map(rusqlite::params![pattern, query.text, per_kind], Self::row_to_goal)?
            .collect::<Result<Vec<_>, _>>()?;

        let task_columns = TASK_COLUMNS
            .split(", ")
            .map(|column| format!("t.{}", column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut task_stmt = self.conn.prepare(&format!(
            "SELECT {}, g.title, g.slug FROM tasks t
             JOIN goals g ON g.id = t.goal_id
             WHERE lower_unicode(t.title) LIKE lower_unicode(?1) ESCAPE '\\'
                OR lower_unicode(t.description) LIKE lower_unicode(?1) ESCAPE '\\'
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT ?2",
            task_columns
        ))?;
        let tasks = task_stmt
            .query_map(rusqlite::params![pattern, per_kind], |row| {
                Ok(TaskHit {
                    task: Self::row_to_task(row)?,
                    goal_title: row.get(9)?,
                    goal_slug: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(query = %query.text, goals = goals.len(), tasks = tasks.len(), "search finished");
        Ok(SearchResults { goals, tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn goal(db: &Database, title: &str) -> Goal {
        db.create_goal(&Goal::new(title.to_string(), String::new())).unwrap()
    }

    fn add_task(db: &Database, goal: &Goal, title: &str) -> TaskUpdate {
        db.create_task(&Task::new(goal.id.unwrap(), title.to_string())).unwrap()
    }

    #[test]
    fn create_goal_assigns_unique_slugs() {
        let db = db();
        let first = goal(&db, "Learn Rust");
        let second = goal(&db, "Learn Rust");
        assert_eq!(first.slug, "learn-rust");
        assert_eq!(second.slug, "learn-rust-1");
        assert_eq!(db.get_goal_by_slug("learn-rust-1").unwrap().id, second.id);
        assert!(matches!(
            db.get_goal_by_slug("missing"),
            Err(DatabaseError::NotFound { kind: "Goal", .. })
        ));
    }

    #[test]
    fn renaming_a_goal_reslugs_it() {
        let db = db();
        goal(&db, "Async Rust");
        let mut g = goal(&db, "Tokio");
        g.title = "Async Rust".to_string();
        let updated = db.update_goal(&g).unwrap();
        assert_eq!(updated.slug, "async-rust-1");

        let mut same = updated.clone();
        same.description = Some("deep dive".to_string());
        assert_eq!(db.update_goal(&same).unwrap().slug, "async-rust-1");
    }

    #[test]
    fn task_mutations_recompute_progress() {
        let db = db();
        let g = goal(&db, "Rust book");
        let a = add_task(&db, &g, "Ch 1");
        assert_eq!(a.goal.progress, 0);
        let b = add_task(&db, &g, "Ch 2");
        let c = add_task(&db, &g, "Ch 3");

        let after = db.set_task_completed(a.task.id.unwrap(), true).unwrap();
        assert_eq!(after.goal.progress, 33);
        assert_eq!(after.goal.status, GoalStatus::Active);

        db.toggle_task(b.task.id.unwrap()).unwrap();
        let done = db.toggle_task(c.task.id.unwrap()).unwrap();
        assert_eq!(done.goal.progress, 100);
        assert_eq!(done.goal.status, GoalStatus::Completed);

        let reopened = add_task(&db, &g, "Ch 4");
        assert_eq!(reopened.goal.progress, 75);
        assert_eq!(reopened.goal.status, GoalStatus::Active);

        let goal_after_delete = db.delete_task(reopened.task.id.unwrap()).unwrap();
        assert_eq!(goal_after_delete.progress, 100);
        assert_eq!(goal_after_delete.status, GoalStatus::Completed);
    }

    #[test]
    fn paused_goal_is_not_reactivated_by_partial_progress() {
        let db = db();
        let mut g = goal(&db, "Paused goal");
        g.status = GoalStatus::Paused;
        let g = db.update_goal(&g).unwrap();
        let tasks: Vec<_> = (0..4).map(|i| add_task(&db, &g, &format!("t{}", i))).collect();
        db.set_task_completed(tasks[0].task.id.unwrap(), true).unwrap();
        let update = db.set_task_completed(tasks[1].task.id.unwrap(), true).unwrap();
        assert_eq!(update.goal.progress, 50);
        assert_eq!(update.goal.status, GoalStatus::Paused);
    }

    #[test]
    fn update_task_keeps_goal_and_recomputes() {
        let db = db();
        let g = goal(&db, "Goal");
        let other = goal(&db, "Other");
        let created = add_task(&db, &g, "Draft");

        let mut edited = created.task.clone();
        edited.title = "Final".to_string();
        edited.completed = true;
        edited.priority = Priority::High;
        edited.goal_id = other.id.unwrap();
        let update = db.update_task(&edited).unwrap();

        assert_eq!(update.task.title, "Final");
        assert_eq!(update.task.goal_id, g.id.unwrap());
        assert_eq!(update.task.created_at, created.task.created_at);
        assert_eq!(update.goal.id, g.id);
        assert_eq!(update.goal.progress, 100);
        assert_eq!(db.get_goal(other.id.unwrap()).unwrap().progress, 0);
    }

    #[test]
    fn tasks_come_back_ranked() {
        let db = db();
        let g = goal(&db, "Ranked");
        let gid = g.id.unwrap();

        let mut done_high = Task::new(gid, "done high".to_string());
        done_high.priority = Priority::High;
        done_high.completed = true;
        let mut late_low = Task::new(gid, "late low".to_string());
        late_low.priority = Priority::Low;
        late_low.due_date = NaiveDate::from_ymd_opt(2099, 1, 1);
        let mut early_medium = Task::new(gid, "early medium".to_string());
        early_medium.due_date = NaiveDate::from_ymd_opt(2020, 1, 1);

        for task in [&done_high, &late_low, &early_medium] {
            db.create_task(task).unwrap();
        }

        let titles: Vec<_> = db
            .get_tasks_for_goal(gid)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["early medium", "late low", "done high"]);
    }

    #[test]
    fn deleting_goal_cascades_to_tasks() {
        let db = db();
        let g = goal(&db, "Doomed");
        let task = add_task(&db, &g, "gone too");
        db.delete_goal(g.id.unwrap()).unwrap();
        assert!(matches!(
            db.get_task(task.task.id.unwrap()),
            Err(DatabaseError::NotFound { kind: "Task", .. })
        ));
        assert!(db.delete_goal(g.id.unwrap()).is_err());
    }

    #[test]
    fn create_task_requires_existing_goal() {
        let db = db();
        let result = db.create_task(&Task::new(999, "orphan".to_string()));
        assert!(matches!(result, Err(DatabaseError::NotFound { kind: "Goal", .. })));
    }

    fn assert_progress_is_derived(db: &Database, goal_id: i64) {
        let stored = db.get_goal(goal_id).unwrap();
        let tasks = db.get_tasks_for_goal(goal_id).unwrap();
        let expected = compute_progress(&tasks, stored.status);
        assert_eq!(stored.progress, expected.progress);
        assert_eq!(stored.status, expected.status);
    }

    #[test]
    fn stored_progress_always_matches_tasks() {
        let db = db();
        let mut seeded = Goal::new("Seeded".to_string(), String::new());
        seeded.progress = 80;
        let g = db.create_goal(&seeded).unwrap();
        let gid = g.id.unwrap();
        assert_eq!(g.progress, 0);

        let tasks: Vec<_> = (0..3).map(|i| add_task(&db, &g, &format!("t{}", i))).collect();
        db.set_task_completed(tasks[0].task.id.unwrap(), true).unwrap();
        assert_progress_is_derived(&db, gid);

        let mut edited = db.get_goal(gid).unwrap();
        edited.progress = 100;
        edited.description = Some("changed".to_string());
        let updated = db.update_goal(&edited).unwrap();
        assert_eq!(updated.progress, 33);
        assert_eq!(updated.status, GoalStatus::Active);
        assert_progress_is_derived(&db, gid);

        db.toggle_task(tasks[1].task.id.unwrap()).unwrap();
        db.delete_task(tasks[2].task.id.unwrap()).unwrap();
        assert_progress_is_derived(&db, gid);
        assert_eq!(db.get_goal(gid).unwrap().progress, 100);
    }

    #[test]
    fn status_edits_follow_task_progress() {
        let db = db();
        let g = goal(&db, "Half done");
        add_task(&db, &g, "one");
        add_task(&db, &g, "two");

        let mut edit = db.get_goal(g.id.unwrap()).unwrap();
        edit.status = GoalStatus::Completed;
        let stored = db.update_goal(&edit).unwrap();
        assert_eq!(stored.progress, 0);
        assert_eq!(stored.status, GoalStatus::Active);

        edit.status = GoalStatus::Paused;
        assert_eq!(db.update_goal(&edit).unwrap().status, GoalStatus::Paused);

        let solo = goal(&db, "Solo");
        let task = add_task(&db, &solo, "only");
        let done = db.set_task_completed(task.task.id.unwrap(), true).unwrap();
        assert_eq!(done.goal.status, GoalStatus::Completed);
        let mut reopen = done.goal.clone();
        reopen.status = GoalStatus::Active;
        let stored = db.update_goal(&reopen).unwrap();
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.status, GoalStatus::Completed);

        // Nothing to derive from, so an empty goal takes the status as given
        let mut empty = goal(&db, "Empty");
        empty.status = GoalStatus::Completed;
        assert_eq!(db.update_goal(&empty).unwrap().status, GoalStatus::Completed);
    }

    #[test]
    fn toggle_flips_and_recomputes() {
        let db = db();
        let g = goal(&db, "Toggle");
        let created = add_task(&db, &g, "flip me");
        let id = created.task.id.unwrap();

        let on = db.toggle_task(id).unwrap();
        assert!(on.task.completed);
        assert_eq!(on.goal.progress, 100);
        assert_eq!(on.goal.status, GoalStatus::Completed);

        let off = db.toggle_task(id).unwrap();
        assert!(!off.task.completed);
        assert_eq!(off.goal.progress, 0);
        assert_eq!(off.goal.status, GoalStatus::Active);

        assert!(matches!(
            db.toggle_task(id + 100),
            Err(DatabaseError::NotFound { kind: "Task", .. })
        ));
    }

    #[test]
    fn unknown_stored_priority_reads_as_unknown() {
        let db = db();
        let g = goal(&db, "Legacy");
        let created = add_task(&db, &g, "old row");
        db.conn()
            .execute(
                "UPDATE tasks SET priority = 'urgent' WHERE id = ?1",
                rusqlite::params![created.task.id],
            )
            .unwrap();
        let task = db.get_task(created.task.id.unwrap()).unwrap();
        assert_eq!(task.priority, Priority::Unknown);
    }

    #[test]
    fn unknown_stored_status_is_an_error() {
        let db = db();
        let g = goal(&db, "Broken");
        db.conn()
            .execute("UPDATE goals SET status = 'archived' WHERE id = ?1", rusqlite::params![g.id])
            .unwrap();
        assert!(matches!(
            db.get_goal(g.id.unwrap()),
            Err(DatabaseError::SqliteError(_))
        ));
    }

    #[test]
    fn search_matches_goals_and_tasks() {
        let db = db();
        let mut tagged = Goal::new("Systems programming".to_string(), String::new());
        tagged.tags = vec!["rust".to_string(), "c".to_string()];
        let tagged = db.create_goal(&tagged).unwrap();
        let mut described = Goal::new("Web".to_string(), String::new());
        described.description = Some("Build a RUST web server".to_string());
        db.create_goal(&described).unwrap();
        goal(&db, "Cooking");
        add_task(&db, &tagged, "Read the Rustonomicon");
        add_task(&db, &tagged, "Write a linked list");

        let results = db.search(&SearchQuery::new("rust", None).unwrap()).unwrap();
        assert_eq!(results.goals.len(), 2);
        assert_eq!(results.tasks.len(), 1);
        assert_eq!(results.tasks[0].goal_slug, tagged.slug);
        assert_eq!(results.tasks[0].goal_title, "Systems programming");

        let capped = db.search(&SearchQuery::new("rust", Some(1)).unwrap()).unwrap();
        assert_eq!(capped.goals.len(), 1);
        assert_eq!(capped.tasks.len(), 1);

        let literal = db.search(&SearchQuery::new("%", None).unwrap()).unwrap();
        assert!(literal.is_empty());
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let db = db();
        let g = goal(&db, "Ölçek Éducation");
        add_task(&db, &g, "Lire ÉTUDE de cas");
        goal(&db, "Education basics");

        let results = db.search(&SearchQuery::new("éducation", None).unwrap()).unwrap();
        assert_eq!(results.goals.len(), 1);
        assert_eq!(results.goals[0].id, g.id);

        let upper = db.search(&SearchQuery::new("ÖLÇEK", None).unwrap()).unwrap();
        assert_eq!(upper.goals.len(), 1);

        let tasks = db.search(&SearchQuery::new("étude", None).unwrap()).unwrap();
        assert_eq!(tasks.tasks.len(), 1);
        assert_eq!(tasks.tasks[0].goal_slug, g.slug);
    }
}
