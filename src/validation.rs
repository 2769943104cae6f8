use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{GoalStatus, ModelError, Priority};
use crate::utils::parse_date;

pub const GOAL_TITLE_MAX: usize = 100;
pub const TASK_TITLE_MAX: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Empty { field: &'static str },
    #[error("{field} must be less than {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}

fn bounded_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

pub fn goal_title(value: &str) -> Result<String, ValidationError> {
    bounded_text("Title", value, GOAL_TITLE_MAX)
}

pub fn task_title(value: &str) -> Result<String, ValidationError> {
    bounded_text("Title", value, TASK_TITLE_MAX)
}

/// Priority typed by a user; unlike stored rows, unknown levels are rejected
pub fn priority(value: &str) -> Result<Priority, ValidationError> {
    Ok(value.parse()?)
}

pub fn status(value: &str) -> Result<GoalStatus, ValidationError> {
    Ok(value.parse()?)
}

pub fn date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    parse_date(value.trim()).map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Optional date field where blank input means "no date"
pub fn optional_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => date(field, v).map(Some),
        _ => Ok(None),
    }
}

/// Trim free text, treating blank as absent
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Split comma-separated tags, dropping blanks
pub fn tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_trimmed_and_bounded() {
        assert_eq!(goal_title("  Learn Rust ").unwrap(), "Learn Rust");
        assert_eq!(goal_title("   "), Err(ValidationError::Empty { field: "Title" }));
        assert!(goal_title(&"a".repeat(100)).is_ok());
        assert_eq!(
            goal_title(&"a".repeat(101)),
            Err(ValidationError::TooLong { field: "Title", max: 100 })
        );
        assert!(task_title(&"é".repeat(200)).is_ok());
        assert!(task_title(&"a".repeat(201)).is_err());
    }

    #[test]
    fn tags_split_and_drop_blanks() {
        assert_eq!(tags("rust, async,, ,cli "), vec!["rust", "async", "cli"]);
        assert!(tags("").is_empty());
    }

    #[test]
    fn dates_and_optional_fields() {
        assert!(date("Due date", "2026-02-30").is_err());
        assert_eq!(optional_date("Due date", Some("  ")).unwrap(), None);
        assert!(optional_date("Due date", Some("2026-02-03")).unwrap().is_some());
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" notes ")), Some("notes".to_string()));
    }

    #[test]
    fn user_priority_is_strict() {
        assert_eq!(priority("High").unwrap(), Priority::High);
        assert!(matches!(priority("unknown"), Err(ValidationError::Model(_))));
    }
}
