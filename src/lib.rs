pub mod cli;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod progress;
pub mod ranking;
pub mod search;
pub mod slug;
pub mod tui;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use database::Database;
pub use models::{Goal, GoalStatus, Priority, Task, TaskFilter};
pub use progress::{GoalProgress, compute_progress};
pub use ranking::rank_tasks;
pub use utils::Profile;
