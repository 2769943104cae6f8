use crate::database::DatabaseError;
use crate::models::{Goal, GoalStatus, Priority, Task, TaskFilter};
use crate::ranking::filter_tasks;
use crate::search::{SearchQuery, SearchResults};
use crate::tui::widgets::editor::Editor;
use crate::validation::{self, ValidationError};
use crate::{Config, Database};
use chrono::NaiveDate;
use ratatui::widgets::ListState;
use std::time::Instant;
use tracing::{debug, warn};

const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;

/// Next (or previous) entry of `order` after `current`, wrapping around
fn step<T: Copy + PartialEq>(order: &[T], current: T, forward: bool) -> T {
    let i = order.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward { (i + 1) % order.len() } else { (i + order.len() - 1) % order.len() };
    order[next]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Goals,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarState {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    Help,
    Form,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Title,
    Description,
    Tags,
    Deadline,
    Status,
}

impl GoalField {
    const ORDER: [GoalField; 5] = [
        GoalField::Title,
        GoalField::Description,
        GoalField::Tags,
        GoalField::Deadline,
        GoalField::Status,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Priority,
    DueDate,
}

impl TaskField {
    const ORDER: [TaskField; 4] = [TaskField::Title, TaskField::Description, TaskField::Priority, TaskField::DueDate];
}

#[derive(Debug, Clone)]
pub struct GoalForm {
    pub current_field: GoalField,
    pub title: Editor,
    pub description: Editor,
    pub tags: Editor,
    pub deadline: Editor,
    pub status: GoalStatus,
    /// None for new goals
    pub editing_goal: Option<Goal>,
}

impl GoalForm {
    fn blank() -> Self {
        Self {
            current_field: GoalField::Title,
            title: Editor::new(),
            description: Editor::new(),
            tags: Editor::new(),
            deadline: Editor::new(),
            status: GoalStatus::Active,
            editing_goal: None,
        }
    }

    fn for_goal(goal: &Goal) -> Self {
        Self {
            current_field: GoalField::Title,
            title: Editor::from_string(&goal.title),
            description: Editor::from_string(goal.description.as_deref().unwrap_or_default()),
            tags: Editor::from_string(&goal.tags_string()),
            deadline: Editor::from_string(&goal.deadline.map(|d| d.to_string()).unwrap_or_default()),
            status: goal.status,
            editing_goal: Some(goal.clone()),
        }
    }

    /// Build the goal to store, or the first field that fails validation
    fn to_goal(&self) -> Result<Goal, ValidationError> {
        let mut goal = match self.editing_goal {
            Some(ref existing) => existing.clone(),
            None => Goal::new(String::new(), String::new()),
        };
        goal.title = validation::goal_title(&self.title.value())?;
        goal.description = validation::optional_text(Some(&self.description.value()));
        goal.tags = validation::tags(&self.tags.value());
        goal.deadline = validation::optional_date("deadline", Some(&self.deadline.value()))?;
        goal.status = self.status;
        Ok(goal)
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub current_field: TaskField,
    pub goal_id: i64,
    pub title: Editor,
    pub description: Editor,
    pub priority: Priority,
    pub due_date: Editor,
    /// None for new tasks
    pub editing_task: Option<Task>,
}

impl TaskForm {
    fn blank(goal_id: i64) -> Self {
        Self {
            current_field: TaskField::Title,
            goal_id,
            title: Editor::new(),
            description: Editor::new(),
            priority: Priority::default(),
            due_date: Editor::new(),
            editing_task: None,
        }
    }

    fn for_task(task: &Task) -> Self {
        Self {
            current_field: TaskField::Title,
            goal_id: task.goal_id,
            title: Editor::from_string(&task.title),
            description: Editor::from_string(task.description.as_deref().unwrap_or_default()),
            priority: task.priority,
            due_date: Editor::from_string(&task.due_date.map(|d| d.to_string()).unwrap_or_default()),
            editing_task: Some(task.clone()),
        }
    }

    fn to_task(&self) -> Result<Task, ValidationError> {
        let mut task = match self.editing_task {
            Some(ref existing) => existing.clone(),
            None => Task::new(self.goal_id, String::new()),
        };
        task.title = validation::task_title(&self.title.value())?;
        task.description = validation::optional_text(Some(&self.description.value()));
        task.priority = self.priority;
        task.due_date = validation::optional_date("due date", Some(&self.due_date.value()))?;
        Ok(task)
    }
}

#[derive(Debug, Clone)]
pub enum ItemForm {
    Goal(GoalForm),
    Task(TaskForm),
}

impl ItemForm {
    pub fn is_editing(&self) -> bool {
        match self {
            ItemForm::Goal(form) => form.editing_goal.is_some(),
            ItemForm::Task(form) => form.editing_task.is_some(),
        }
    }

    /// Whether the current field is a choice cycled with Left/Right
    pub fn on_choice_field(&self) -> bool {
        match self {
            ItemForm::Goal(form) => form.current_field == GoalField::Status,
            ItemForm::Task(form) => form.current_field == TaskField::Priority,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DeleteTarget {
    Goal(Goal),
    Task(Task),
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub focus: Focus,
    pub sidebar_state: SidebarState,
    pub mode: Mode,
    pub goal_list_state: ListState,
    pub task_list_state: ListState,
    pub description_scroll: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::Goals,
            sidebar_state: SidebarState::Expanded,
            mode: Mode::View,
            goal_list_state: ListState::default(),
            task_list_state: ListState::default(),
            description_scroll: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub delete_target: Option<DeleteTarget>,
    /// 0 = Delete, 1 = Cancel
    pub delete_modal_selection: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub results: SearchResults,
    pub list_state: ListState,
}

/// A row in the search results list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHit {
    Goal { goal_id: i64 },
    Task { goal_id: i64, task_id: i64 },
}

pub struct App {
    pub config: Config,
    pub database: Database,
    pub today: NaiveDate,

    pub goals: Vec<Goal>,
    /// All tasks of the selected goal, ranked
    pub tasks: Vec<Task>,
    pub task_filter: TaskFilter,

    pub ui: UiState,
    pub modals: ModalState,
    pub status: StatusState,
    pub search: SearchState,
    pub form: Option<ItemForm>,
}

impl App {
    pub fn new(config: Config, database: Database) -> Result<Self, DatabaseError> {
        let task_filter = config.default_task_filter;
        let mut app = Self {
            config,
            database,
            today: crate::utils::today(),
            goals: Vec::new(),
            tasks: Vec::new(),
            task_filter,
            ui: UiState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
            search: SearchState::default(),
            form: None,
        };
        app.load_goals()?;
        Ok(app)
    }

    /// Reload goals from the database, keeping the current selection in range
    pub fn load_goals(&mut self) -> Result<(), DatabaseError> {
        self.goals = self.database.get_all_goals()?;
        let selected = match self.ui.goal_list_state.selected() {
            _ if self.goals.is_empty() => None,
            Some(i) => Some(i.min(self.goals.len() - 1)),
            None => Some(0),
        };
        self.ui.goal_list_state.select(selected);
        self.load_tasks()
    }

    /// Reload the selected goal's tasks
    pub fn load_tasks(&mut self) -> Result<(), DatabaseError> {
        self.tasks = match self.selected_goal().and_then(|g| g.id) {
            Some(goal_id) => self.database.get_tasks_for_goal(goal_id)?,
            None => Vec::new(),
        };
        self.clamp_task_selection();
        Ok(())
    }

    fn clamp_task_selection(&mut self) {
        let visible = self.visible_tasks().len();
        let selected = match self.ui.task_list_state.selected() {
            _ if visible == 0 => None,
            Some(i) => Some(i.min(visible - 1)),
            None => Some(0),
        };
        self.ui.task_list_state.select(selected);
    }

    pub fn selected_goal(&self) -> Option<&Goal> {
        self.ui.goal_list_state.selected().and_then(|i| self.goals.get(i))
    }

    /// Tasks shown under the current filter, in ranked order
    pub fn visible_tasks(&self) -> Vec<Task> {
        filter_tasks(&self.tasks, self.task_filter)
    }

    pub fn selected_task(&self) -> Option<Task> {
        let index = self.ui.task_list_state.selected()?;
        self.visible_tasks().into_iter().nth(index)
    }

    /// Completed and total task counts for the selected goal
    pub fn task_counts(&self) -> (usize, usize) {
        let done = self.tasks.iter().filter(|t| t.completed).count();
        (done, self.tasks.len())
    }

    /// Swap in a goal returned by a write, without reordering the list
    fn replace_goal(&mut self, goal: Goal) {
        if let Some(slot) = self.goals.iter_mut().find(|g| g.id == goal.id) {
            *slot = goal;
        }
    }

    fn select_goal_by_id(&mut self, goal_id: i64) -> Result<(), DatabaseError> {
        if let Some(index) = self.goals.iter().position(|g| g.id == Some(goal_id)) {
            self.ui.goal_list_state.select(Some(index));
            self.ui.task_list_state.select(Some(0));
            self.ui.description_scroll = 0;
            self.load_tasks()?;
        }
        Ok(())
    }

    fn select_task_by_id(&mut self, task_id: i64) {
        if let Some(index) = self.visible_tasks().iter().position(|t| t.id == Some(task_id)) {
            self.ui.task_list_state.select(Some(index));
        }
    }

    pub fn move_selection_up(&mut self) -> Result<(), DatabaseError> {
        match self.ui.focus {
            Focus::Goals => {
                if let Some(i) = self.ui.goal_list_state.selected().filter(|i| *i > 0) {
                    self.ui.goal_list_state.select(Some(i - 1));
                    self.on_goal_changed()?;
                }
            }
            Focus::Tasks => {
                if let Some(i) = self.ui.task_list_state.selected().filter(|i| *i > 0) {
                    self.ui.task_list_state.select(Some(i - 1));
                }
            }
        }
        Ok(())
    }

    pub fn move_selection_down(&mut self) -> Result<(), DatabaseError> {
        match self.ui.focus {
            Focus::Goals => {
                if let Some(i) = self.ui.goal_list_state.selected().filter(|i| i + 1 < self.goals.len()) {
                    self.ui.goal_list_state.select(Some(i + 1));
                    self.on_goal_changed()?;
                }
            }
            Focus::Tasks => {
                let visible = self.visible_tasks().len();
                if let Some(i) = self.ui.task_list_state.selected().filter(|i| i + 1 < visible) {
                    self.ui.task_list_state.select(Some(i + 1));
                }
            }
        }
        Ok(())
    }

    fn on_goal_changed(&mut self) -> Result<(), DatabaseError> {
        self.ui.task_list_state.select(Some(0));
        self.ui.description_scroll = 0;
        self.load_tasks()
    }

    pub fn switch_focus(&mut self) {
        self.ui.focus = match self.ui.focus {
            Focus::Goals if self.selected_goal().is_some() => Focus::Tasks,
            Focus::Goals => Focus::Goals,
            Focus::Tasks => Focus::Goals,
        };
    }

    pub fn toggle_sidebar(&mut self) {
        self.ui.sidebar_state = match self.ui.sidebar_state {
            SidebarState::Expanded => SidebarState::Collapsed,
            SidebarState::Collapsed => SidebarState::Expanded,
        };
        if self.ui.sidebar_state == SidebarState::Collapsed && self.selected_goal().is_some() {
            self.ui.focus = Focus::Tasks;
        }
    }

    pub fn cycle_task_filter(&mut self) {
        self.task_filter = self.task_filter.next();
        self.ui.task_list_state.select(Some(0));
        self.clamp_task_selection();
        self.set_status_message(format!("Showing: {}", self.task_filter.label()));
    }

    pub fn scroll_description_up(&mut self) {
        self.ui.description_scroll = self.ui.description_scroll.saturating_sub(1);
    }

    pub fn scroll_description_down(&mut self) {
        self.ui.description_scroll += 1;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    // Search

    pub fn enter_search_mode(&mut self) {
        self.ui.mode = Mode::Search;
        self.search = SearchState::default();
    }

    pub fn exit_search_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn add_to_search(&mut self, ch: char) {
        self.search.query.push(ch);
        self.run_search();
    }

    pub fn remove_from_search(&mut self) {
        self.search.query.pop();
        self.run_search();
    }

    /// Re-run the query; a blank query just clears the results
    pub fn run_search(&mut self) {
        if self.search.query.trim().is_empty() {
            self.search.results = SearchResults::default();
            self.search.list_state.select(None);
            return;
        }
        let outcome = SearchQuery::new(&self.search.query, None)
            .map_err(DatabaseError::from)
            .and_then(|query| self.database.search(&query));
        match outcome {
            Ok(results) => {
                let selected = if results.is_empty() { None } else { Some(0) };
                self.search.results = results;
                self.search.list_state.select(selected);
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                self.set_status_message(format!("Search failed: {}", e));
            }
        }
    }

    /// Flattened result rows: goals first, then tasks
    pub fn search_hits(&self) -> Vec<SearchHit> {
        let goals = self.search.results.goals.iter().filter_map(|g| g.id).map(|goal_id| SearchHit::Goal { goal_id });
        let tasks = self.search.results.tasks.iter().filter_map(|hit| {
            hit.task.id.map(|task_id| SearchHit::Task { goal_id: hit.task.goal_id, task_id })
        });
        goals.chain(tasks).collect()
    }

    pub fn move_search_selection(&mut self, down: bool) {
        let len = self.search_hits().len();
        if len == 0 {
            return;
        }
        let current = self.search.list_state.selected().unwrap_or(0);
        let next = if down { (current + 1).min(len - 1) } else { current.saturating_sub(1) };
        self.search.list_state.select(Some(next));
    }

    /// Jump to the selected search result and leave search mode
    pub fn open_search_result(&mut self) -> Result<(), DatabaseError> {
        let hit = self
            .search
            .list_state
            .selected()
            .and_then(|i| self.search_hits().get(i).copied());
        self.exit_search_mode();
        match hit {
            Some(SearchHit::Goal { goal_id }) => {
                self.select_goal_by_id(goal_id)?;
                self.ui.focus = Focus::Goals;
            }
            Some(SearchHit::Task { goal_id, task_id }) => {
                self.task_filter = TaskFilter::All;
                self.select_goal_by_id(goal_id)?;
                self.select_task_by_id(task_id);
                self.ui.focus = Focus::Tasks;
            }
            None => {}
        }
        Ok(())
    }

    // Forms

    /// Open a blank form for whatever the focused pane lists
    pub fn enter_create_mode(&mut self) {
        let form = match self.ui.focus {
            Focus::Goals => ItemForm::Goal(GoalForm::blank()),
            Focus::Tasks => match self.selected_goal().and_then(|g| g.id) {
                Some(goal_id) => ItemForm::Task(TaskForm::blank(goal_id)),
                None => {
                    self.set_status_message("Select a goal first".to_string());
                    return;
                }
            },
        };
        self.form = Some(form);
        self.ui.mode = Mode::Form;
    }

    pub fn enter_edit_mode(&mut self) {
        let form = match self.ui.focus {
            Focus::Goals => self.selected_goal().map(|g| ItemForm::Goal(GoalForm::for_goal(g))),
            Focus::Tasks => self.selected_task().map(|t| ItemForm::Task(TaskForm::for_task(&t))),
        };
        if let Some(form) = form {
            self.form = Some(form);
            self.ui.mode = Mode::Form;
        }
    }

    pub fn exit_form_mode(&mut self) {
        self.form = None;
        self.ui.mode = Mode::View;
    }

    pub fn navigate_form_field(&mut self, forward: bool) {
        match self.form {
            Some(ItemForm::Goal(ref mut form)) => {
                form.current_field = step(&GoalField::ORDER, form.current_field, forward);
            }
            Some(ItemForm::Task(ref mut form)) => {
                form.current_field = step(&TaskField::ORDER, form.current_field, forward);
            }
            None => {}
        }
    }

    /// The text editor under the cursor; None on choice fields
    pub fn current_form_editor(&mut self) -> Option<&mut Editor> {
        match self.form.as_mut()? {
            ItemForm::Goal(form) => match form.current_field {
                GoalField::Title => Some(&mut form.title),
                GoalField::Description => Some(&mut form.description),
                GoalField::Tags => Some(&mut form.tags),
                GoalField::Deadline => Some(&mut form.deadline),
                GoalField::Status => None,
            },
            ItemForm::Task(form) => match form.current_field {
                TaskField::Title => Some(&mut form.title),
                TaskField::Description => Some(&mut form.description),
                TaskField::DueDate => Some(&mut form.due_date),
                TaskField::Priority => None,
            },
        }
    }

    /// Step the status or priority choice
    pub fn cycle_form_choice(&mut self, forward: bool) {
        const PRIORITIES: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];
        match self.form {
            Some(ItemForm::Goal(ref mut form)) if form.current_field == GoalField::Status => {
                form.status = step(&GoalStatus::ALL, form.status, forward);
            }
            Some(ItemForm::Task(ref mut form)) if form.current_field == TaskField::Priority => {
                form.priority = step(&PRIORITIES, form.priority, forward);
            }
            _ => {}
        }
    }

    /// Validate and store the open form. Validation and database failures
    /// are reported in the status bar and keep the form open.
    pub fn save_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let outcome = match form {
            ItemForm::Goal(ref goal_form) => self.save_goal_form(goal_form),
            ItemForm::Task(ref task_form) => self.save_task_form(task_form),
        };
        match outcome {
            Ok(message) => {
                self.exit_form_mode();
                self.set_status_message(message);
            }
            Err(DatabaseError::Validation(e)) => {
                self.set_status_message(format!("Validation error: {}", e));
            }
            Err(e) => {
                warn!(error = %e, "failed to save form");
                self.set_status_message(format!("Failed to save: {}", e));
            }
        }
    }

    fn save_goal_form(&mut self, form: &GoalForm) -> Result<String, DatabaseError> {
        let goal = form.to_goal()?;
        let stored = if goal.id.is_some() {
            self.database.update_goal(&goal)?
        } else {
            self.database.create_goal(&goal)?
        };
        let verb = if form.editing_goal.is_some() { "updated" } else { "created" };
        self.load_goals()?;
        if let Some(id) = stored.id {
            self.select_goal_by_id(id)?;
        }
        self.ui.focus = Focus::Goals;
        if stored.status != goal.status {
            return Ok(format!(
                "Goal {}: {} (status {} at {}%)",
                verb, stored.slug, stored.status, stored.progress
            ));
        }
        Ok(format!("Goal {}: {}", verb, stored.slug))
    }

    fn save_task_form(&mut self, form: &TaskForm) -> Result<String, DatabaseError> {
        let task = form.to_task()?;
        let update = if task.id.is_some() {
            self.database.update_task(&task)?
        } else {
            self.database.create_task(&task)?
        };
        let verb = if form.editing_task.is_some() { "updated" } else { "added" };
        let progress = update.goal.progress;
        self.replace_goal(update.goal);
        self.load_tasks()?;
        if let Some(id) = update.task.id {
            self.select_task_by_id(id);
        }
        Ok(format!("Task {} · goal at {}%", verb, progress))
    }

    // Task actions

    pub fn toggle_selected_task(&mut self) {
        let Some(task_id) = self.selected_task().and_then(|t| t.id) else {
            return;
        };
        match self.database.toggle_task(task_id) {
            Ok(update) => {
                let state = if update.task.completed { "done" } else { "not done" };
                let message = format!(
                    "Task marked {} · goal at {}% ({})",
                    state, update.goal.progress, update.goal.status
                );
                self.replace_goal(update.goal);
                if let Err(e) = self.load_tasks() {
                    self.set_status_message(format!("Failed to reload tasks: {}", e));
                    return;
                }
                self.select_task_by_id(task_id);
                debug!(task_id, "toggled task");
                self.set_status_message(message);
            }
            Err(e) => self.set_status_message(format!("Failed to update task: {}", e)),
        }
    }

    // Deletion

    pub fn request_delete(&mut self) {
        let target = match self.ui.focus {
            Focus::Goals => self.selected_goal().cloned().map(DeleteTarget::Goal),
            Focus::Tasks => self.selected_task().map(DeleteTarget::Task),
        };
        if let Some(target) = target {
            self.modals.delete_target = Some(target);
            self.modals.delete_modal_selection = 1;
            self.ui.mode = Mode::ConfirmDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_target = None;
        self.ui.mode = Mode::View;
    }

    pub fn toggle_delete_selection(&mut self) {
        self.modals.delete_modal_selection = 1 - self.modals.delete_modal_selection.min(1);
    }

    /// Run the chosen modal option
    pub fn confirm_delete(&mut self) {
        let target = self.modals.delete_target.take();
        self.ui.mode = Mode::View;
        if self.modals.delete_modal_selection != 0 {
            return;
        }
        let outcome = match target {
            Some(DeleteTarget::Goal(goal)) => self.delete_goal(&goal),
            Some(DeleteTarget::Task(task)) => self.delete_task(&task),
            None => return,
        };
        match outcome {
            Ok(message) => self.set_status_message(message),
            Err(e) => self.set_status_message(format!("Failed to delete: {}", e)),
        }
    }

    fn delete_goal(&mut self, goal: &Goal) -> Result<String, DatabaseError> {
        let id = goal.id.ok_or(DatabaseError::Unsaved("Goal"))?;
        self.database.delete_goal(id)?;
        self.ui.focus = Focus::Goals;
        self.load_goals()?;
        Ok(format!("Goal deleted: {}", goal.title))
    }

    fn delete_task(&mut self, task: &Task) -> Result<String, DatabaseError> {
        let id = task.id.ok_or(DatabaseError::Unsaved("Task"))?;
        let goal = self.database.delete_task(id)?;
        let message = format!("Task deleted · goal at {}%", goal.progress);
        self.replace_goal(goal);
        self.load_tasks()?;
        Ok(message)
    }
}
