use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::truncate_with_ellipsis;

const SEPARATOR: &str = " • ";

/// Join as many hints as fit in `max_width`, adding "..." when some are dropped
pub fn fit_key_hints(key_hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in key_hints.iter().enumerate() {
        let extra = if i == 0 { hint.chars().count() } else { SEPARATOR.chars().count() + hint.chars().count() };
        if text.chars().count() + extra > max_width {
            if i == 0 {
                return truncate_with_ellipsis(hint, max_width);
            }
            if text.chars().count() + 3 <= max_width {
                text.push_str("...");
            } else {
                text = truncate_with_ellipsis(&text, max_width);
            }
            break;
        }
        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}

pub fn render_status_bar(f: &mut Frame, area: Rect, message: Option<&String>, key_hints: &[String], config: &Config) {
    let theme = config.get_active_theme();
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(msg) => (
            truncate_with_ellipsis(msg, max_width),
            Style::default()
                .fg(parse_color(&theme.highlight_fg))
                .bg(parse_color(&theme.highlight_bg))
                .add_modifier(Modifier::BOLD),
        ),
        None => (
            fit_key_hints(key_hints, max_width),
            Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg)),
        ),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_hints_that_do_not_fit() {
        let hints = vec!["q: Quit".to_string(), "n: New".to_string(), "e: Edit".to_string()];
        assert_eq!(fit_key_hints(&hints, 100), "q: Quit • n: New • e: Edit");
        assert_eq!(fit_key_hints(&hints, 20), "q: Quit • n: New...");
        assert_eq!(fit_key_hints(&hints, 5), "q:...");
    }
}
