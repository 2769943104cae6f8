use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::KeyBindings;
use crate::tui::Layout;
use crate::tui::app::{App, Focus, Mode, SidebarState};
use crate::tui::error::TuiError;
use crate::tui::widgets::form::field_text_width;
use crate::utils::{ParsedKeyBinding, parse_key_binding};

/// Guard that restores the terminal even on panic. A terminal left in raw
/// mode or on the alternate screen is unusable for the user.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut guard = Self { raw_mode_enabled: true, alternate_screen_enabled: false };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate_screen_enabled = true;
        Ok(guard)
    }

    /// Restore explicitly on normal exit; drop then does nothing
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already cleaning up; errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Key bindings parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub toggle_task: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub filter: ParsedKeyBinding,
    pub switch_focus: ParsedKeyBinding,
    pub toggle_sidebar: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
    pub save: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_bindings(kb: &KeyBindings) -> Result<Self, TuiError> {
        let parse = |action: &'static str, binding: &str| {
            parse_key_binding(binding).map_err(|reason| TuiError::KeyBindingError { action, reason })
        };
        Ok(Self {
            quit: parse("quit", &kb.quit)?,
            new: parse("new", &kb.new)?,
            edit: parse("edit", &kb.edit)?,
            delete: parse("delete", &kb.delete)?,
            toggle_task: parse("toggle_task", &kb.toggle_task)?,
            search: parse("search", &kb.search)?,
            filter: parse("filter", &kb.filter)?,
            switch_focus: parse("switch_focus", &kb.switch_focus)?,
            toggle_sidebar: parse("toggle_sidebar", &kb.toggle_sidebar)?,
            list_up: parse("list_up", &kb.list_up)?,
            list_down: parse("list_down", &kb.list_down)?,
            save: parse("save", &kb.save)?,
            help: parse("help", &kb.help)?,
        })
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let keymap = KeyMap::from_bindings(&app.config.key_bindings)?;
    let mut guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    info!("tui started");

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);

        if app.ui.mode == Mode::Form {
            let text_width = field_text_width(terminal_rect);
            if let Some(editor) = app.current_form_editor() {
                editor.update_horizontal_scroll(text_width);
            }
        }

        terminal.draw(|f| {
            let layout = Layout::calculate(
                terminal_rect,
                app.config.sidebar_width_percent,
                app.ui.sidebar_state == SidebarState::Collapsed,
            );
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Poll with a timeout so expired status messages get cleared
        if event::poll(Duration::from_millis(100))? {
            // Only Press events; Windows also reports Release
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, &keymap, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    info!("tui exited");
    Ok(())
}

/// Route a key press by mode. Returns true when the user asked to quit.
pub fn handle_key_event(app: &mut App, keymap: &KeyMap, key: KeyEvent) -> Result<bool, TuiError> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }
    match app.ui.mode {
        Mode::View => handle_view_mode(app, keymap, key),
        Mode::Help => {
            if key.code == KeyCode::Esc || keymap.help.matches(&key) {
                app.exit_help_mode();
            }
            Ok(false)
        }
        Mode::Search => handle_search_mode(app, key),
        Mode::Form => {
            handle_form_mode(app, keymap, key);
            Ok(false)
        }
        Mode::ConfirmDelete => {
            handle_delete_modal(app, keymap, key);
            Ok(false)
        }
    }
}

fn handle_view_mode(app: &mut App, keymap: &KeyMap, key: KeyEvent) -> Result<bool, TuiError> {
    if keymap.quit.matches(&key) {
        return Ok(true);
    }
    if keymap.help.matches(&key) {
        app.enter_help_mode();
    } else if keymap.search.matches(&key) {
        app.enter_search_mode();
    } else if keymap.new.matches(&key) {
        app.enter_create_mode();
    } else if keymap.edit.matches(&key) {
        app.enter_edit_mode();
    } else if keymap.delete.matches(&key) {
        app.request_delete();
    } else if keymap.toggle_task.matches(&key) {
        if app.ui.focus == Focus::Tasks {
            app.toggle_selected_task();
        }
    } else if keymap.filter.matches(&key) {
        app.cycle_task_filter();
    } else if keymap.switch_focus.matches(&key) {
        app.switch_focus();
    } else if keymap.toggle_sidebar.matches(&key) {
        app.toggle_sidebar();
    } else if keymap.list_up.matches(&key) || key.code == KeyCode::Up {
        app.move_selection_up()?;
    } else if keymap.list_down.matches(&key) || key.code == KeyCode::Down {
        app.move_selection_down()?;
    } else {
        match key.code {
            KeyCode::Enter if app.ui.focus == Focus::Goals => app.switch_focus(),
            KeyCode::PageUp => app.scroll_description_up(),
            KeyCode::PageDown => app.scroll_description_down(),
            KeyCode::Esc => app.clear_status_message(),
            _ => debug!(?key, "unbound key"),
        }
    }
    Ok(false)
}

fn handle_search_mode(app: &mut App, key: KeyEvent) -> Result<bool, TuiError> {
    match key.code {
        KeyCode::Esc => app.exit_search_mode(),
        KeyCode::Enter => app.open_search_result()?,
        KeyCode::Up => app.move_search_selection(false),
        KeyCode::Down => app.move_search_selection(true),
        KeyCode::Backspace => app.remove_from_search(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.add_to_search(ch),
        _ => {}
    }
    Ok(false)
}

fn handle_form_mode(app: &mut App, keymap: &KeyMap, key: KeyEvent) {
    if keymap.save.matches(&key) {
        app.save_form();
        return;
    }
    let on_choice = app.form.as_ref().is_some_and(|f| f.on_choice_field());
    match key.code {
        KeyCode::Esc => app.exit_form_mode(),
        KeyCode::Tab | KeyCode::Enter => app.navigate_form_field(true),
        KeyCode::BackTab => app.navigate_form_field(false),
        KeyCode::Left if on_choice => app.cycle_form_choice(false),
        KeyCode::Right | KeyCode::Char(' ') if on_choice => app.cycle_form_choice(true),
        _ => {
            let Some(editor) = app.current_form_editor() else {
                return;
            };
            match key.code {
                KeyCode::Left => editor.move_cursor_left(),
                KeyCode::Right => editor.move_cursor_right(),
                KeyCode::Home => editor.move_cursor_home(),
                KeyCode::End => editor.move_cursor_end(),
                KeyCode::Backspace => editor.delete_char(),
                KeyCode::Delete => editor.delete_forward(),
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => editor.insert_char(ch),
                _ => {}
            }
        }
    }
}

fn handle_delete_modal(app: &mut App, keymap: &KeyMap, key: KeyEvent) {
    if key.code == KeyCode::Up
        || key.code == KeyCode::Down
        || keymap.list_up.matches(&key)
        || keymap.list_down.matches(&key)
    {
        app.toggle_delete_selection();
        return;
    }
    match key.code {
        KeyCode::Enter => app.confirm_delete(),
        KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
}
