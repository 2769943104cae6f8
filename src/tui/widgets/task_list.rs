use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Scrollbar, ScrollbarOrientation, ScrollbarState,
};

use crate::Config;
use crate::models::{Priority, Task, TaskFilter};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::truncate_with_ellipsis;

/// Urgency flag shown at the start of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueMarker {
    Overdue,
    DueSoon,
    None,
}

impl DueMarker {
    pub fn for_task(task: &Task, today: NaiveDate, due_soon_days: i64) -> Self {
        if task.is_overdue(today) {
            DueMarker::Overdue
        } else if task.is_due_soon(today, due_soon_days) {
            DueMarker::DueSoon
        } else {
            DueMarker::None
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            DueMarker::Overdue => "!",
            DueMarker::DueSoon => "~",
            DueMarker::None => " ",
        }
    }
}

fn priority_symbol(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "H",
        Priority::Medium => "M",
        Priority::Low => "L",
        Priority::Unknown => "?",
    }
}

/// Row text: marker, checkbox, priority, title, due date
pub fn task_row_text(task: &Task, marker: DueMarker) -> String {
    let check = if task.completed { "✓" } else { "○" };
    let due = task.due_date.map(|d| format!(" [{}]", d)).unwrap_or_default();
    format!("{}{} {} {}{}", marker.symbol(), check, priority_symbol(task.priority), task.title, due)
}

pub struct TaskListView<'a> {
    pub tasks: &'a [Task],
    pub total_count: usize,
    pub filter: TaskFilter,
    pub today: NaiveDate,
    pub focused: bool,
}

pub fn render_task_list(f: &mut Frame, area: Rect, view: TaskListView<'_>, list_state: &mut ListState, config: &Config) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let accent = parse_color(&theme.accent);
    let warning = parse_color(&theme.warning);
    let max_width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = view
        .tasks
        .iter()
        .map(|task| {
            let marker = DueMarker::for_task(task, view.today, config.due_soon_days);
            let style = if task.completed {
                Style::default().fg(fg).add_modifier(Modifier::DIM)
            } else {
                match marker {
                    DueMarker::Overdue => Style::default().fg(warning).add_modifier(Modifier::BOLD),
                    DueMarker::DueSoon => Style::default().fg(warning),
                    DueMarker::None => Style::default().fg(fg),
                }
            };
            let text = truncate_with_ellipsis(&task_row_text(task, marker), max_width);
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();
    let total_items = items.len();

    // Split area to reserve space for scrollbar
    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let title = format!("Tasks · {} ({} of {})", view.filter.label(), view.tasks.len(), view.total_count);
    let border_style = if view.focused { Style::default().fg(accent) } else { Style::default().fg(fg) };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).border_style(border_style).title(title))
        .style(Style::default().fg(fg))
        .highlight_style(
            Style::default()
                .fg(parse_color(&theme.highlight_fg))
                .bg(parse_color(&theme.highlight_bg)),
        );

    f.render_stateful_widget(list, list_area, list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if total_items > visible_items && visible_items > 0 && scrollbar_area.width > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let selected_index = list_state.selected().unwrap_or(0);
        let mut scrollbar_state = ScrollbarState::new(total_items)
            .viewport_content_length(visible_items)
            .position(selected_index.saturating_sub(visible_items - 1));

        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");

        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
