use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use std::time::Duration;

use crate::controller::{Command, ModalKind};
use crate::models::EventType;
use crate::tui::App;
use crate::tui::app::{FormEdit, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::confirm_delete::OPTIONS;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Guard that ensures terminal state is restored even on panic.
/// If the terminal is left in raw mode or the alternate screen, the user's
/// shell is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore terminal state on normal exit; the guard does nothing on drop afterwards
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
        // Errors are ignored, we're already cleaning up
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    tracing::info!(width, height, "entered TUI");

    loop {
        app.tick();

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // The poll timeout doubles as the refresh tick
        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                // Only Press, so Windows doesn't see every key twice
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    if handle_key_event(&mut app, key_event)? {
                        break;
                    }
                }
                // Layout is recomputed on the next draw
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    guard.restore()?;
    tracing::info!("left TUI");
    Ok(())
}

/// Route a key press to whatever currently has focus. Returns `true` to quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if app.planner.pending_delete().is_some() {
        handle_delete_confirmation(app, key_event);
        return Ok(false);
    }
    if let Some(kind) = app.planner.open_modal() {
        handle_form(app, kind, key_event);
        return Ok(false);
    }
    match app.ui.mode {
        Mode::Help => {
            handle_help(app, key_event);
            Ok(false)
        }
        Mode::Search => {
            handle_search(app, key_event);
            Ok(false)
        }
        Mode::View => handle_view(app, key_event),
    }
}

fn handle_delete_confirmation(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
            app.ui.delete_selection = (app.ui.delete_selection + 1) % OPTIONS.len();
        }
        KeyCode::Enter if app.ui.delete_selection == 0 => {
            app.dispatch(Command::ConfirmDelete);
        }
        KeyCode::Char('y') => {
            app.dispatch(Command::ConfirmDelete);
        }
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') => {
            app.dispatch(Command::CancelDelete);
        }
        _ => {}
    }
}

fn handle_form(app: &mut App, kind: ModalKind, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Esc => {
            app.dispatch(Command::Cancel(kind));
        }
        KeyCode::Enter => {
            app.dispatch(Command::Submit(kind));
        }
        KeyCode::Tab | KeyCode::Down => app.navigate_form_field(true),
        KeyCode::BackTab | KeyCode::Up => app.navigate_form_field(false),
        KeyCode::Left => app.edit_form(FormEdit::Cycle { forward: false }),
        KeyCode::Right => app.edit_form(FormEdit::Cycle { forward: true }),
        KeyCode::Backspace => app.edit_form(FormEdit::Backspace),
        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_form(FormEdit::Insert(c));
        }
        _ => {}
    }
}

fn handle_help(app: &mut App, key_event: KeyEvent) {
    let (code, modifiers) = (key_event.code, key_event.modifiers);
    if code == KeyCode::Esc || app.keys.help.matches(code, modifiers) || app.keys.quit.matches(code, modifiers) {
        app.ui.mode = Mode::View;
    }
}

fn handle_search(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Esc => {
            app.dispatch(Command::SearchNotes(String::new()));
            app.exit_search_mode();
        }
        KeyCode::Enter => app.exit_search_mode(),
        KeyCode::Backspace => app.remove_from_search(),
        KeyCode::Char(c) => app.add_to_search(c),
        _ => {}
    }
}

fn handle_view(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let (code, modifiers) = (key_event.code, key_event.modifiers);
    let keys = app.keys.clone();

    if keys.quit.matches(code, modifiers) {
        return Ok(true);
    }
    if keys.help.matches(code, modifiers) {
        app.ui.mode = Mode::Help;
        return Ok(false);
    }
    if let Some(tab) = keys
        .tabs
        .iter()
        .position(|binding| binding.matches(code, modifiers))
        .and_then(|index| Tab::ALL.get(index))
    {
        app.switch_tab(*tab);
        return Ok(false);
    }
    if keys.new.matches(code, modifiers) {
        app.dispatch(Command::OpenCreate(app.tab_kind()));
        return Ok(false);
    }
    if keys.delete.matches(code, modifiers) {
        if let Some((kind, id)) = app.selected_record() {
            app.dispatch(Command::RequestDelete { kind, id });
        }
        return Ok(false);
    }
    if keys.edit.matches(code, modifiers) {
        if let Some((kind, id)) = app.selected_record() {
            app.dispatch(Command::OpenEdit { kind, id });
        }
        return Ok(false);
    }

    match app.ui.current_tab {
        Tab::Calendar => handle_calendar(app, &keys, code, modifiers),
        Tab::Tasks => handle_tasks(app, &keys, code, modifiers),
        Tab::Notebooks | Tab::StickyNotes => handle_board(app, &keys, code, modifiers),
    }
    Ok(false)
}

fn handle_calendar(app: &mut App, keys: &crate::tui::app::KeyMap, code: KeyCode, modifiers: KeyModifiers) {
    let presets = [
        (&keys.class_preset, EventType::Class),
        (&keys.assignment_preset, EventType::Assignment),
        (&keys.exam_preset, EventType::Exam),
        (&keys.study_preset, EventType::Study),
    ];
    if let Some((_, event_type)) = presets.iter().find(|(binding, _)| binding.matches(code, modifiers)) {
        app.dispatch(Command::OpenEventPreset(*event_type));
        return;
    }

    if keys.grab.matches(code, modifiers) {
        app.grab_or_drop();
    } else if keys.quick_add.matches(code, modifiers) {
        app.dispatch(Command::QuickAddEvent);
    } else if keys.prev_week.matches(code, modifiers) {
        app.dispatch(Command::PreviousWeek);
    } else if keys.next_week.matches(code, modifiers) {
        app.dispatch(Command::NextWeek);
    } else if keys.today.matches(code, modifiers) {
        app.go_to_current_week();
    } else {
        match code {
            KeyCode::Left => app.move_cursor(-1, 0),
            KeyCode::Right => app.move_cursor(1, 0),
            KeyCode::Up => app.move_cursor(0, -1),
            KeyCode::Down => app.move_cursor(0, 1),
            KeyCode::PageUp => app.move_cursor(0, -6),
            KeyCode::PageDown => app.move_cursor(0, 6),
            KeyCode::Tab => app.next_cell_item(),
            KeyCode::Enter => app.activate_cell(),
            KeyCode::Esc => app.cancel_grab(),
            _ => {}
        }
    }
}

fn handle_tasks(app: &mut App, keys: &crate::tui::app::KeyMap, code: KeyCode, modifiers: KeyModifiers) {
    let query = app.planner.task_query();
    if keys.toggle.matches(code, modifiers) {
        if let Some(id) = app.selected_task_id() {
            app.dispatch(Command::ToggleTask(id));
        }
    } else if keys.cycle_priority.matches(code, modifiers) {
        app.dispatch(Command::SetPriorityFilter(query.priority.next()));
    } else if keys.cycle_status.matches(code, modifiers) {
        app.dispatch(Command::SetStatusFilter(query.status.next()));
    } else if keys.cycle_sort.matches(code, modifiers) {
        app.dispatch(Command::SetSort(query.sort.next()));
    } else {
        match code {
            KeyCode::Up => app.move_selection(-1),
            KeyCode::Down => app.move_selection(1),
            KeyCode::Enter => {
                if let Some(id) = app.selected_task_id() {
                    app.dispatch(Command::OpenEdit {
                        kind: ModalKind::Task,
                        id,
                    });
                }
            }
            _ => {}
        }
    }
}

fn handle_board(app: &mut App, keys: &crate::tui::app::KeyMap, code: KeyCode, modifiers: KeyModifiers) {
    if keys.search.matches(code, modifiers) {
        app.enter_search_mode();
        return;
    }
    match code {
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::PageDown => app.ui.detail_scroll = app.ui.detail_scroll.saturating_add(5),
        KeyCode::PageUp => app.ui.detail_scroll = app.ui.detail_scroll.saturating_sub(5),
        KeyCode::Enter => {
            if let Some((kind, id)) = app.selected_record() {
                app.dispatch(Command::OpenEdit { kind, id });
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::controller::Planner;
    use crate::storage::{MemoryStore, StorageGateway};
    use crate::store::EntityStore;
    use crate::utils::parse_date;
    use chrono::NaiveDateTime;

    fn fixed_now() -> NaiveDateTime {
        parse_date("2024-06-12")
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn app() -> App {
        let store = EntityStore::load(StorageGateway::new(Box::new(MemoryStore::new())));
        App::new(Config::default(), Planner::with_clock(store, fixed_now)).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn quit_only_from_view_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn task_created_toggled_and_deleted_with_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.ui.current_tab, Tab::Tasks);

        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Read chapter 4");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.planner.store().tasks().len(), 1);
        assert_eq!(app.selected_task_id().as_deref(), Some(app.planner.store().tasks()[0].id.as_str()));

        press(&mut app, KeyCode::Char(' '));
        assert!(app.planner.store().tasks()[0].completed);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.planner.pending_delete().is_some());
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        // Cancel was selected
        assert_eq!(app.planner.store().tasks().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Enter);
        assert!(app.planner.store().tasks().is_empty());
        assert_eq!(app.ui.task_list.selected(), None);
    }

    #[test]
    fn empty_title_keeps_form_open_with_message() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        let form = app.planner.notebook_modal.form().unwrap();
        assert_eq!(form.error.as_deref(), Some("Please enter a title"));
        assert!(app.planner.store().notebooks().is_empty());
    }

    #[test]
    fn search_mode_captures_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "qn");
        assert_eq!(app.planner.note_search(), "qn");
        assert_eq!(app.ui.current_tab, Tab::StickyNotes);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.planner.note_search(), "");
        assert_eq!(app.ui.mode, Mode::View);
    }

    #[test]
    fn week_navigation_keys() {
        let mut app = app();
        let start = app.planner.week_start();
        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.planner.week_start(), start + chrono::Duration::days(7));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.planner.week_start(), start);
    }

    #[test]
    fn preset_opens_typed_event_form() {
        let mut app = app();
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT)).unwrap();
        let form = app.planner.event_modal.form().unwrap();
        assert_eq!(form.draft.event_type, EventType::Exam);
    }
}
