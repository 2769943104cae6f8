use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let theme = config.get_active_theme();
    let style = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));

    let popup = popup_area(area, 60, 70);
    f.render_widget(Clear, popup);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(style),
        )
        .style(style)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup);
}

pub fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Move up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {}: Switch between goals and tasks\n", key(&kb.switch_focus)));
    text.push_str("  Enter: Open the selected goal's tasks\n");
    text.push_str("  PageUp / PageDown: Scroll goal description\n");
    text.push('\n');

    text.push_str("Goals and tasks:\n");
    text.push_str(&format!("  {}: New goal or task (depends on focus)\n", key(&kb.new)));
    text.push_str(&format!("  {}: Edit selected\n", key(&kb.edit)));
    text.push_str(&format!("  {}: Delete selected\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Mark task done / not done\n", key(&kb.toggle_task)));
    text.push_str(&format!("  {}: Cycle task filter (all, pending, completed)\n", key(&kb.filter)));
    text.push_str(&format!("  {}: Search goals and tasks\n", key(&kb.search)));
    text.push('\n');

    text.push_str("Task markers:\n");
    text.push_str("  !: Overdue\n");
    text.push_str(&format!("  ~: Due within {} days\n", config.due_soon_days));
    text.push_str("  H / M / L: Priority\n");
    text.push('\n');

    text.push_str("Forms:\n");
    text.push_str("  Tab/Enter, Shift+Tab: Next / previous field\n");
    text.push_str("  Left/Right: Change status or priority\n");
    text.push_str(&format!("  {}: Save\n", key(&kb.save)));
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Toggle sidebar\n", key(&kb.toggle_sidebar)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_reflects_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.toggle_task = "x".to_string();
        let text = build_help_text(&config);
        assert!(text.contains("  x: Mark task done / not done"));
        assert!(text.contains("Due within 3 days"));
    }
}
