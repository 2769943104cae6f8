use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::tui::app::{GoalField, GoalForm, ItemForm, TaskField, TaskForm};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::popup_area;

/// One form row: either a text input or a Left/Right choice
enum FieldView<'a> {
    Text(&'a Editor),
    Choice(&'a str),
}

struct FieldRow<'a> {
    label: &'static str,
    view: FieldView<'a>,
    active: bool,
}

fn goal_rows(form: &GoalForm) -> Vec<FieldRow<'_>> {
    let field = form.current_field;
    vec![
        FieldRow { label: "Title", view: FieldView::Text(&form.title), active: field == GoalField::Title },
        FieldRow {
            label: "Description",
            view: FieldView::Text(&form.description),
            active: field == GoalField::Description,
        },
        FieldRow { label: "Tags (comma-separated)", view: FieldView::Text(&form.tags), active: field == GoalField::Tags },
        FieldRow {
            label: "Deadline (YYYY-MM-DD)",
            view: FieldView::Text(&form.deadline),
            active: field == GoalField::Deadline,
        },
        FieldRow { label: "Status", view: FieldView::Choice(form.status.as_str()), active: field == GoalField::Status },
    ]
}

fn task_rows(form: &TaskForm) -> Vec<FieldRow<'_>> {
    let field = form.current_field;
    vec![
        FieldRow { label: "Title", view: FieldView::Text(&form.title), active: field == TaskField::Title },
        FieldRow {
            label: "Description",
            view: FieldView::Text(&form.description),
            active: field == TaskField::Description,
        },
        FieldRow {
            label: "Priority",
            view: FieldView::Choice(form.priority.label()),
            active: field == TaskField::Priority,
        },
        FieldRow {
            label: "Due date (YYYY-MM-DD)",
            view: FieldView::Text(&form.due_date),
            active: field == TaskField::DueDate,
        },
    ]
}

/// Width available to text inside a field box
pub fn field_text_width(area: Rect) -> usize {
    popup_area(area, 70, 80).width.saturating_sub(4) as usize
}

pub fn render_form(f: &mut Frame, area: Rect, form: &ItemForm, config: &Config) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let bg = parse_color(&theme.bg);
    let accent = parse_color(&theme.accent);

    let (kind, rows) = match form {
        ItemForm::Goal(goal_form) => ("Goal", goal_rows(goal_form)),
        ItemForm::Task(task_form) => ("Task", task_rows(task_form)),
    };
    let title = if form.is_editing() { format!("Edit {}", kind) } else { format!("New {}", kind) };

    let popup = popup_area(area, 70, 80);
    f.render_widget(Clear, popup);
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(fg).bg(bg));
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    let mut constraints: Vec<Constraint> = rows.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let areas = Layout::default().direction(Direction::Vertical).constraints(constraints).split(inner);

    for (row, field_area) in rows.iter().zip(areas.iter()) {
        let border_style = if row.active {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(fg)
        };
        let block = Block::default().borders(Borders::ALL).border_style(border_style).title(row.label);
        let text_width = field_area.width.saturating_sub(2) as usize;

        match row.view {
            FieldView::Text(editor) => {
                let (visible, cursor_x) = editor.visible(text_width);
                f.render_widget(Paragraph::new(visible).block(block), *field_area);
                if row.active {
                    let x = field_area.x + 1 + cursor_x.min(text_width.saturating_sub(1)) as u16;
                    f.set_cursor_position(Position::new(x, field_area.y + 1));
                }
            }
            FieldView::Choice(value) => {
                let line = Line::from(vec![
                    Span::raw("< "),
                    Span::styled(value.to_string(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" >"),
                ]);
                f.render_widget(Paragraph::new(line).block(block), *field_area);
            }
        }
    }
}
