pub mod color;
pub mod confirm_delete;
pub mod editor;
pub mod form;
pub mod goal_list;
pub mod goal_view;
pub mod help;
pub mod search_results;
pub mod status_bar;
pub mod task_list;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Centered rect covering a percentage of `area`.
/// Based on ratatui popup example: https://ratatui.rs/examples/apps/popup/
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

/// Cut `text` to `max_width` chars, ending in "..." when shortened
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_chars() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("résumé writing", 8), "résum...");
    }
}
