//! Goal progress aggregation.
//!
//! A goal's `progress` is derived from its tasks and never authoritative on
//! its own. Callers hand in the full post-mutation task set and persist the
//! returned pair; nothing here touches storage.

use crate::models::{GoalStatus, Task};

/// Progress percentage and status to write back onto a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub progress: u8,
    pub status: GoalStatus,
}

/// Percentage of `done` out of `total`, rounded half up.
///
/// Integer arithmetic keeps 1 of 3 at exactly 33 and 2 of 3 at 67. An empty
/// set is 0%.
pub fn percent_complete(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((200 * done + total) / (2 * total)) as u8
}

/// Status policy applied whenever progress is recomputed or a status is edited.
///
/// Reaching 100 always completes the goal, even a paused or cancelled one.
/// A completed goal that drops below 100 reverts to active. Anything else
/// keeps the user's status.
pub fn status_for(progress: u8, current: GoalStatus) -> GoalStatus {
    if progress >= 100 {
        GoalStatus::Completed
    } else if current == GoalStatus::Completed {
        GoalStatus::Active
    } else {
        current
    }
}

/// Recompute a goal's progress and status from its complete task set
pub fn compute_progress(tasks: &[Task], current: GoalStatus) -> GoalProgress {
    let total = tasks.len();
    let done = tasks.iter().filter(|task| task.completed).count();
    let progress = percent_complete(done, total);

    // An empty goal has nothing to complete, so it never auto-completes
    let status = if total == 0 {
        current
    } else {
        status_for(progress, current)
    };

    GoalProgress { progress, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(done: usize, pending: usize) -> Vec<Task> {
        let mut out = Vec::new();
        for i in 0..done {
            let mut task = Task::new(1, format!("done {}", i));
            task.completed = true;
            out.push(task);
        }
        for i in 0..pending {
            out.push(Task::new(1, format!("pending {}", i)));
        }
        out
    }

    #[test]
    fn empty_goal_is_zero_and_keeps_status() {
        for status in GoalStatus::ALL {
            let result = compute_progress(&[], status);
            assert_eq!(result.progress, 0);
            assert_eq!(result.status, status);
        }
    }

    #[test]
    fn all_done_completes_regardless_of_status() {
        for status in GoalStatus::ALL {
            let result = compute_progress(&tasks(3, 0), status);
            assert_eq!(result.progress, 100);
            assert_eq!(result.status, GoalStatus::Completed);
        }
    }

    #[test]
    fn partial_progress_reverts_completed_only() {
        let set = tasks(1, 2);
        for status in GoalStatus::ALL {
            let result = compute_progress(&set, status);
            assert!(result.progress > 0 && result.progress < 100);
            let expected = if status == GoalStatus::Completed {
                GoalStatus::Active
            } else {
                status
            };
            assert_eq!(result.status, expected);
        }
    }

    #[test]
    fn thirds_round_to_whole_percent() {
        assert_eq!(compute_progress(&tasks(1, 2), GoalStatus::Active).progress, 33);
        assert_eq!(compute_progress(&tasks(2, 1), GoalStatus::Active).progress, 67);
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(percent_complete(1, 8), 13);
        assert_eq!(percent_complete(1, 200), 1);
        assert_eq!(percent_complete(199, 200), 100);
        assert_eq!(percent_complete(0, 5), 0);
    }

    #[test]
    fn paused_goal_at_half_stays_paused() {
        let result = compute_progress(&tasks(2, 2), GoalStatus::Paused);
        assert_eq!(result, GoalProgress { progress: 50, status: GoalStatus::Paused });
    }

    #[test]
    fn adding_a_task_to_finished_goal_reactivates_it() {
        let before = compute_progress(&tasks(2, 0), GoalStatus::Active);
        assert_eq!(before.status, GoalStatus::Completed);
        let after = compute_progress(&tasks(2, 1), before.status);
        assert_eq!(after, GoalProgress { progress: 67, status: GoalStatus::Active });
    }
}
