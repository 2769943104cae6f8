//! Display order for a goal's tasks: unfinished, important, soon-due work first.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::models::{Task, TaskFilter};

/// Total order over tasks.
///
/// Keys, each breaking ties left by the previous one:
/// 1. incomplete before completed
/// 2. higher priority weight first
/// 3. tasks with a due date before tasks without, earlier dates first
/// 4. earlier `created_at` first
/// 5. lower id first, unsaved tasks last
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| compare_due_dates(a.due_date, b.due_date))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| compare_ids(a.id, b.id))
}

fn compare_due_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_ids(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ranked copy of `tasks`; the input is left untouched
pub fn rank_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut ranked = tasks.to_vec();
    rank_tasks_in_place(&mut ranked);
    ranked
}

pub fn rank_tasks_in_place(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}

/// Keep only tasks matching `filter`, preserving order
pub fn filter_tasks(tasks: &[Task], filter: TaskFilter) -> Vec<Task> {
    tasks.iter().filter(|task| filter.matches(task)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(minute: u32) -> NaiveDateTime {
        date("2025-01-01").and_hms_opt(12, minute, 0).unwrap()
    }

    fn task(id: i64, priority: Priority, completed: bool, due: Option<&str>, minute: u32) -> Task {
        let mut task = Task::new(1, format!("task {}", id));
        task.id = Some(id);
        task.priority = priority;
        task.completed = completed;
        task.due_date = due.map(date);
        task.created_at = at(minute);
        task.updated_at = at(minute);
        task
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().filter_map(|t| t.id).collect()
    }

    #[test]
    fn pending_due_dates_beat_completed_high_priority() {
        let tasks = vec![
            task(1, Priority::High, true, None, 0),
            task(2, Priority::Low, false, Some("2099-01-01"), 1),
            task(3, Priority::Medium, false, Some("2020-01-01"), 2),
        ];
        assert_eq!(ids(&rank_tasks(&tasks)), vec![3, 2, 1]);
    }

    #[test]
    fn earlier_creation_breaks_ties() {
        let tasks = vec![
            task(1, Priority::Medium, false, None, 5),
            task(2, Priority::Medium, false, None, 3),
        ];
        for _ in 0..3 {
            assert_eq!(ids(&rank_tasks(&tasks)), vec![2, 1]);
        }
    }

    #[test]
    fn id_breaks_identical_timestamps() {
        let tasks = vec![
            task(9, Priority::Low, false, None, 0),
            task(4, Priority::Low, false, None, 0),
        ];
        assert_eq!(ids(&rank_tasks(&tasks)), vec![4, 9]);
    }

    #[test]
    fn dated_before_undated_then_earliest() {
        let tasks = vec![
            task(1, Priority::High, false, None, 0),
            task(2, Priority::High, false, Some("2026-05-02"), 1),
            task(3, Priority::High, false, Some("2026-05-01"), 2),
        ];
        assert_eq!(ids(&rank_tasks(&tasks)), vec![3, 2, 1]);
    }

    #[test]
    fn unknown_priority_sorts_after_low() {
        let tasks = vec![
            task(1, Priority::Unknown, false, None, 0),
            task(2, Priority::Low, false, None, 1),
            task(3, Priority::High, false, None, 2),
            task(4, Priority::Medium, false, None, 3),
        ];
        assert_eq!(ids(&rank_tasks(&tasks)), vec![3, 4, 2, 1]);
    }

    #[test]
    fn incomplete_always_first_and_ranking_is_idempotent() {
        let tasks = vec![
            task(1, Priority::High, true, Some("2020-01-01"), 0),
            task(2, Priority::Unknown, false, None, 9),
            task(3, Priority::Low, true, None, 1),
            task(4, Priority::Medium, false, Some("2030-06-01"), 2),
            task(5, Priority::High, true, None, 3),
            task(6, Priority::Low, false, Some("2021-01-01"), 4),
        ];
        let ranked = rank_tasks(&tasks);
        let first_done = ranked.iter().position(|t| t.completed).unwrap();
        assert!(ranked[..first_done].iter().all(|t| !t.completed));
        assert!(ranked[first_done..].iter().all(|t| t.completed));
        assert_eq!(rank_tasks(&ranked), ranked);
    }

    #[test]
    fn ranking_leaves_input_alone() {
        let tasks = vec![
            task(1, Priority::Low, false, None, 0),
            task(2, Priority::High, false, None, 1),
        ];
        let before = tasks.clone();
        let _ = rank_tasks(&tasks);
        assert_eq!(tasks, before);
    }

    #[test]
    fn filter_keeps_order() {
        let tasks = vec![
            task(1, Priority::High, false, None, 0),
            task(2, Priority::High, true, None, 1),
            task(3, Priority::Low, false, None, 2),
        ];
        assert_eq!(ids(&filter_tasks(&tasks, TaskFilter::Pending)), vec![1, 3]);
        assert_eq!(ids(&filter_tasks(&tasks, TaskFilter::Completed)), vec![2]);
        assert_eq!(ids(&filter_tasks(&tasks, TaskFilter::All)), vec![1, 2, 3]);
    }
}
