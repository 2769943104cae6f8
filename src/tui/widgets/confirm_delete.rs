use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::app::DeleteTarget;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;

/// Modal options, indexed by `ModalState::delete_modal_selection`
pub const DELETE_OPTIONS: [&str; 2] = ["Delete", "Cancel"];

pub fn render_confirm_delete(f: &mut Frame, area: Rect, target: &DeleteTarget, selection: usize, config: &Config) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let bg = parse_color(&theme.bg);
    let highlight_bg = parse_color(&theme.highlight_bg);
    let highlight_fg = parse_color(&theme.highlight_fg);
    let base = Style::default().fg(fg).bg(bg);

    let popup = popup_area(area, 50, 35);
    f.render_widget(Clear, popup);

    let (question, name, warning) = match target {
        DeleteTarget::Goal(goal) => (
            "Delete this goal?",
            goal.title.as_str(),
            Some("All of its tasks will be deleted too."),
        ),
        DeleteTarget::Task(task) => ("Delete this task?", task.title.as_str(), None),
    };

    let mut lines = vec![
        Line::from(Span::styled(question, base)),
        Line::from(""),
        Line::from(Span::styled(name.to_string(), base)),
    ];
    if let Some(warning) = warning {
        lines.push(Line::from(Span::styled(warning, Style::default().fg(parse_color(&theme.warning)))));
    }
    lines.push(Line::from(""));

    for (index, option) in DELETE_OPTIONS.iter().enumerate() {
        let (prefix, style) = if index == selection {
            ("> ", Style::default().fg(highlight_fg).bg(highlight_bg))
        } else {
            ("  ", base)
        };
        lines.push(Line::from(Span::styled(format!("{}{}", prefix, option), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("↑↓ to choose, Enter to confirm, Esc to cancel", base)));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Delete")
                .title_alignment(Alignment::Center)
                .style(base),
        )
        .style(base)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(paragraph, popup);
}
