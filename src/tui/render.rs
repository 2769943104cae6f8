use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};

use crate::tui::app::{App, Focus, Mode, SidebarState};
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::render_form,
    goal_list::render_goal_list,
    goal_view::render_goal_view,
    help::render_help,
    search_results::render_search,
    status_bar::render_status_bar,
    task_list::{TaskListView, render_task_list},
};
use crate::tui::Layout;
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let theme = app.config.get_active_theme();
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("goalpost")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg)));
    f.render_widget(outer_block, f.area());

    if app.ui.sidebar_state == SidebarState::Expanded && layout.sidebar_area.width > 0 {
        let focused = app.ui.focus == Focus::Goals;
        render_goal_list(f, layout.sidebar_area, &app.goals, &mut app.ui.goal_list_state, focused, &app.config);
    }

    let counts = app.task_counts();
    render_goal_view(f, layout.goal_area, app.selected_goal(), counts, app.ui.description_scroll, &app.config);

    let visible = app.visible_tasks();
    let view = TaskListView {
        tasks: &visible,
        total_count: app.tasks.len(),
        filter: app.task_filter,
        today: app.today,
        focused: app.ui.focus == Focus::Tasks,
    };
    render_task_list(f, layout.tasks_area, view, &mut app.ui.task_list_state, &app.config);

    // Overlays go on top of the normal content
    match app.ui.mode {
        Mode::Help => render_help(f, f.area(), &app.config),
        Mode::Search => {
            render_search(f, f.area(), &app.search.query, &app.search.results, &mut app.search.list_state, &app.config)
        }
        Mode::Form => {
            if let Some(ref form) = app.form {
                render_form(f, f.area(), form, &app.config);
            }
        }
        Mode::ConfirmDelete => {
            if let Some(ref target) = app.modals.delete_target {
                render_confirm_delete(f, f.area(), target, app.modals.delete_modal_selection, &app.config);
            }
        }
        Mode::View => {}
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

pub fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Close help", key(&kb.help))],
        Mode::Search => vec![
            "Type to search".to_string(),
            "↑/↓: Select".to_string(),
            "Enter: Open".to_string(),
            "Esc: Close".to_string(),
        ],
        Mode::Form => vec![
            "Tab/Enter: Next field".to_string(),
            "Shift+Tab: Previous field".to_string(),
            "←/→: Change choice".to_string(),
            format!("{}: Save", key(&kb.save)),
            "Esc: Cancel".to_string(),
        ],
        Mode::ConfirmDelete => vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()],
        Mode::View => {
            let mut hints = vec![format!("{}: Quit", key(&kb.quit)), format!("{}: New", key(&kb.new))];
            if app.selected_goal().is_some() {
                hints.push(format!("{}: Edit", key(&kb.edit)));
                hints.push(format!("{}: Delete", key(&kb.delete)));
            }
            if app.ui.focus == Focus::Tasks {
                hints.push(format!("{}: Done/undo", key(&kb.toggle_task)));
                hints.push(format!("{}: Filter", key(&kb.filter)));
            }
            hints.push(format!("{}: Switch pane", key(&kb.switch_focus)));
            hints.push(format!("{}: Search", key(&kb.search)));
            hints.push(format!("{}: Sidebar", key(&kb.toggle_sidebar)));
            hints.push(format!("{}: Help", key(&kb.help)));
            hints
        }
    }
}
