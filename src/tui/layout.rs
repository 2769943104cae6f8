use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub sidebar_area: Rect,
    /// Selected goal: description, gauge, metadata
    pub goal_area: Rect,
    pub tasks_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions, not counting the outer border.
    /// Width fits a 25-column goal list plus a usable task pane.
    pub const MIN_WIDTH: u16 = 50;
    pub const MIN_HEIGHT: u16 = 14;

    pub fn calculate(size: Rect, sidebar_width_percent: u16, sidebar_collapsed: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Sidebar: requested percent, at least 25 columns, at most 50%, and
        // never squeezing the main pane below 20 columns
        let sidebar_width = if sidebar_collapsed {
            0
        } else {
            let requested = (inner_area.width * sidebar_width_percent) / 100;
            let max_width = (inner_area.width * 50) / 100;
            requested.max(25).min(max_width).min(inner_area.width.saturating_sub(20))
        };

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Content (sidebar + main)
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
            .split(vertical[0]);

        let main = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(horizontal[1]);

        Self {
            inner_area,
            sidebar_area: horizontal[0],
            goal_area: main[0],
            tasks_area: main[1],
            status_area: vertical[1],
        }
    }
}
