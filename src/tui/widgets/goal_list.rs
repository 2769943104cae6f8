use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::Config;
use crate::models::{Goal, GoalStatus};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::truncate_with_ellipsis;

/// Sidebar row text: progress then title
pub fn goal_row_text(goal: &Goal) -> String {
    format!("{:>3}% {}", goal.progress, goal.title)
}

pub fn render_goal_list(
    f: &mut Frame,
    area: Rect,
    goals: &[Goal],
    list_state: &mut ListState,
    focused: bool,
    config: &Config,
) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let accent = parse_color(&theme.accent);
    let max_width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = goals
        .iter()
        .map(|goal| {
            let style = match goal.status {
                GoalStatus::Completed => Style::default().fg(accent),
                GoalStatus::Paused | GoalStatus::Cancelled => Style::default().fg(fg).add_modifier(Modifier::DIM),
                GoalStatus::Active => Style::default().fg(fg),
            };
            let text = truncate_with_ellipsis(&goal_row_text(goal), max_width);
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    let border_style = if focused { Style::default().fg(accent) } else { Style::default().fg(fg) };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!("Goals ({})", goals.len())),
        )
        .style(Style::default().fg(fg))
        .highlight_style(
            Style::default()
                .fg(parse_color(&theme.highlight_fg))
                .bg(parse_color(&theme.highlight_bg)),
        );

    f.render_stateful_widget(list, area, list_state);
}
