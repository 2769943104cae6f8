use serde::Serialize;

use crate::models::{Goal, Task};
use crate::validation::ValidationError;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: &str, limit: Option<usize>) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty { field: "Search query" });
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(ValidationError::OutOfRange {
                field: "limit",
                min: 1,
                max: MAX_SEARCH_LIMIT as i64,
                value: limit as i64,
            });
        }
        Ok(Self {
            text: text.to_string(),
            limit,
        })
    }

    /// Cap applied to goals and tasks separately
    pub fn per_kind_limit(&self) -> usize {
        self.limit.div_ceil(2)
    }

    /// LIKE pattern with `%`, `_` and the escape char itself escaped
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.text.len() + 2);
        pattern.push('%');
        for ch in self.text.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }
}

/// A task hit together with the goal it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct TaskHit {
    pub task: Task,
    pub goal_title: String,
    pub goal_slug: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub goals: Vec<Goal>,
    pub tasks: Vec<TaskHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty() && self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.goals.len() + self.tasks.len()
    }
}
