use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratskin::RatSkin;
use std::cmp;
use termimad::minimad::Text as MinimadText;

use crate::Config;
use crate::models::Goal;
use crate::tui::widgets::color::parse_color;

/// Goal details as markdown; the description is user-written markdown
pub fn goal_markdown(goal: &Goal, done: usize, total: usize) -> String {
    let mut content = format!("**Status:** {}\n", goal.status);
    content.push_str(&format!("**Tasks:** {} of {} completed\n", done, total));
    if let Some(deadline) = goal.deadline {
        content.push_str(&format!("**Deadline:** {}\n", deadline));
    }
    if !goal.tags.is_empty() {
        content.push_str(&format!("**Tags:** {}\n", goal.tags_string()));
    }
    if let Some(ref description) = goal.description {
        content.push('\n');
        content.push_str(description);
        content.push('\n');
    }
    content
}

pub fn render_goal_view(
    f: &mut Frame,
    area: Rect,
    goal: Option<&Goal>,
    counts: (usize, usize),
    scroll_offset: usize,
    config: &Config,
) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);

    let Some(goal) = goal else {
        let paragraph = Paragraph::new("No goal selected. Press the new-item key in the goals pane to create one.")
            .block(Block::default().borders(Borders::ALL).title("Goal"))
            .style(Style::default().fg(fg))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };
    if area.width < 4 || area.height < 5 {
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(goal.title.as_str()))
        .gauge_style(Style::default().fg(parse_color(&theme.accent)).add_modifier(Modifier::BOLD))
        .percent(u16::from(goal.progress.min(100)))
        .label(format!("{}%", goal.progress));
    f.render_widget(gauge, parts[0]);

    let (done, total) = counts;
    let markdown = goal_markdown(goal, done, total);
    let text_width: u16 = parts[1].width.saturating_sub(2);
    let lines: Vec<Line> = RatSkin::default()
        .parse(MinimadText::from(markdown.as_str()), text_width)
        .into_iter()
        .map(|line| {
            let spans: Vec<Span> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect();
            Line::from(spans)
        })
        .collect();

    let viewport_height = parts[1].height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(viewport_height);
    let start = cmp::min(scroll_offset, max_scroll);
    let end = cmp::min(start + viewport_height, lines.len());
    let visible = Text::from(lines[start..end].to_vec());

    // trim: false keeps list indentation
    let paragraph = Paragraph::new(visible)
        .block(Block::default().borders(Borders::ALL).title(format!("/{}", goal.slug)))
        .style(Style::default().fg(fg))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, parts[1]);
}
