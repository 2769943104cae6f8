use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of days ahead that counts as "due soon" unless configured otherwise
pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown goal status: {0}")]
    UnknownStatus(String),
    #[error("Unknown priority: {0}")]
    UnknownPriority(String),
    #[error("Unknown task filter: {0}")]
    UnknownFilter(String),
}

/// Task urgency. `Unknown` only ever comes from stored data that no longer
/// matches a known level; it ranks below every real priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Unknown,
}

impl Priority {
    /// Sort weight, higher ranks first
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Unknown => 0,
        }
    }

    /// Lenient parse used when reading stored rows
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or(Priority::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Unknown => "unknown",
        }
    }

    /// Human-readable label; unknown values display as the default level
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Low => "Low",
            Priority::Medium | Priority::Unknown => "Medium",
        }
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ModelError::UnknownPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl GoalStatus {
    pub const ALL: [GoalStatus; 4] = [
        GoalStatus::Active,
        GoalStatus::Completed,
        GoalStatus::Paused,
        GoalStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Paused => "paused",
            GoalStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for GoalStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "paused" => Ok(GoalStatus::Paused),
            "cancelled" => Ok(GoalStatus::Cancelled),
            _ => Err(ModelError::UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tasks a list view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }

    /// Next filter in the All -> Pending -> Completed cycle
    pub fn next(self) -> Self {
        match self {
            TaskFilter::All => TaskFilter::Pending,
            TaskFilter::Pending => TaskFilter::Completed,
            TaskFilter::Completed => TaskFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskFilter::All => "All Tasks",
            TaskFilter::Pending => "Pending",
            TaskFilter::Completed => "Completed",
        }
    }
}

impl FromStr for TaskFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" | "done" => Ok(TaskFilter::Completed),
            _ => Err(ModelError::UnknownFilter(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub goal_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    pub fn new(goal_id: i64, title: String) -> Self {
        let now = now_timestamp();
        Self {
            id: None,
            goal_id,
            title,
            description: None,
            completed: false,
            priority: Priority::default(),
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole days from `today` until the due date, negative once it has passed
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    /// Pending and due within the next `window_days` days (today included)
    pub fn is_due_soon(&self, today: NaiveDate, window_days: i64) -> bool {
        if self.completed {
            return false;
        }
        self.days_until_due(today)
            .is_some_and(|days| (0..=window_days).contains(&days))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deadline: Option<NaiveDate>,
    pub progress: u8,
    pub status: GoalStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Goal {
    pub fn new(title: String, slug: String) -> Self {
        let now = now_timestamp();
        Self {
            id: None,
            title,
            slug,
            description: None,
            tags: Vec::new(),
            deadline: None,
            progress: 0,
            status: GoalStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tags_string(&self) -> String {
        self.tags.join(", ")
    }
}

/// Current UTC time as stored on rows
pub fn now_timestamp() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn stored_priority_falls_back_to_unknown() {
        assert_eq!(Priority::from_stored("urgent"), Priority::Unknown);
        assert_eq!(Priority::from_stored("medium"), Priority::Medium);
        assert_eq!(Priority::Unknown.weight(), 0);
        assert_eq!(Priority::Unknown.label(), "Medium");
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert_eq!("Paused".parse::<GoalStatus>().unwrap(), GoalStatus::Paused);
        assert_eq!(
            "archived".parse::<GoalStatus>(),
            Err(ModelError::UnknownStatus("archived".to_string()))
        );
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new(7, "Read chapter 1".to_string());
        assert_eq!(task.goal_id, 7);
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn overdue_and_due_soon() {
        let today = date("2026-03-10");
        let mut task = Task::new(1, "Practice".to_string());
        assert!(!task.is_overdue(today));
        assert_eq!(task.days_until_due(today), None);

        task.due_date = Some(date("2026-03-09"));
        assert!(task.is_overdue(today));
        assert!(!task.is_due_soon(today, DEFAULT_DUE_SOON_DAYS));
        assert_eq!(task.days_until_due(today), Some(-1));

        task.due_date = Some(date("2026-03-13"));
        assert!(!task.is_overdue(today));
        assert!(task.is_due_soon(today, DEFAULT_DUE_SOON_DAYS));

        task.due_date = Some(date("2026-03-14"));
        assert!(!task.is_due_soon(today, DEFAULT_DUE_SOON_DAYS));

        task.due_date = Some(date("2026-03-01"));
        task.completed = true;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn filter_cycles_and_matches() {
        let mut task = Task::new(1, "x".to_string());
        assert!(TaskFilter::Pending.matches(&task));
        task.completed = true;
        assert!(TaskFilter::Completed.matches(&task));
        assert!(!TaskFilter::Pending.matches(&task));
        assert_eq!(TaskFilter::Completed.next(), TaskFilter::All);
        assert_eq!("done".parse::<TaskFilter>().unwrap(), TaskFilter::Completed);
    }
}
