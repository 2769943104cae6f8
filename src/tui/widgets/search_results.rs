use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

use crate::Config;
use crate::search::SearchResults;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::{popup_area, truncate_with_ellipsis};

/// Result rows in the same order as `App::search_hits`
pub fn result_rows(results: &SearchResults) -> Vec<String> {
    let goals = results.goals.iter().map(|g| format!("[goal] {:>3}% {}", g.progress, g.title));
    let tasks = results.tasks.iter().map(|hit| {
        let check = if hit.task.completed { "✓" } else { "○" };
        format!("[task] {} {}  ({})", check, hit.task.title, hit.goal_title)
    });
    goals.chain(tasks).collect()
}

pub fn render_search(f: &mut Frame, area: Rect, query: &str, results: &SearchResults, list_state: &mut ListState, config: &Config) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let bg = parse_color(&theme.bg);

    let popup = popup_area(area, 70, 60);
    f.render_widget(Clear, popup);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(popup);

    let input = Paragraph::new(format!("{}_", query))
        .block(Block::default().borders(Borders::ALL).title("Search"))
        .style(Style::default().fg(fg).bg(bg));
    f.render_widget(input, parts[0]);

    let max_width = parts[1].width.saturating_sub(4) as usize;
    let rows = result_rows(results);
    let title = if query.trim().is_empty() {
        "Type to search goals and tasks".to_string()
    } else {
        format!("Results ({})", rows.len())
    };
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(truncate_with_ellipsis(row, max_width)))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg).bg(bg))
        .highlight_style(
            Style::default()
                .fg(parse_color(&theme.highlight_fg))
                .bg(parse_color(&theme.highlight_bg)),
        );
    f.render_stateful_widget(list, parts[1], list_state);
}
