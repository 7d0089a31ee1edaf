use chrono::{Datelike, Timelike};
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};

use crate::Config;
use crate::calendar::{self, DAYS_PER_WEEK, PlacedEvent, SLOTS_PER_DAY, WeekGrid};
use crate::controller::{Command, ModalKind, Outcome, Planner, PlannerError};
use crate::tui::error::TuiError;
use crate::tui::widgets::form::FormFields;
use crate::utils::{ParsedKeyBinding, parse_key_binding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Calendar,
    Tasks,
    Notebooks,
    StickyNotes,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Calendar, Tab::Tasks, Tab::Notebooks, Tab::StickyNotes];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Calendar => "Calendar",
            Tab::Tasks => "Tasks",
            Tab::Notebooks => "Notebooks",
            Tab::StickyNotes => "Sticky Notes",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Calendar => 0,
            Tab::Tasks => 1,
            Tab::Notebooks => 2,
            Tab::StickyNotes => 3,
        }
    }
}

/// Screen mode on top of the planner's own modal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    Help,
}

/// One edit applied to the focused form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEdit {
    Insert(char),
    Backspace,
    Cycle { forward: bool },
}

/// Key bindings from the config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub quick_add: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub grab: ParsedKeyBinding,
    pub toggle: ParsedKeyBinding,
    pub prev_week: ParsedKeyBinding,
    pub next_week: ParsedKeyBinding,
    pub today: ParsedKeyBinding,
    pub class_preset: ParsedKeyBinding,
    pub assignment_preset: ParsedKeyBinding,
    pub exam_preset: ParsedKeyBinding,
    pub study_preset: ParsedKeyBinding,
    pub cycle_priority: ParsedKeyBinding,
    pub cycle_status: ParsedKeyBinding,
    pub cycle_sort: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
    pub tabs: [ParsedKeyBinding; 4],
}

impl KeyMap {
    pub fn from_config(config: &Config) -> Result<Self, TuiError> {
        let k = &config.key_bindings;
        let parse = |name: &str, value: &str| {
            parse_key_binding(value)
                .map_err(|e| TuiError::KeyBindingError(format!("{}: {}", name, e)))
        };
        Ok(Self {
            quit: parse("quit", &k.quit)?,
            new: parse("new", &k.new)?,
            quick_add: parse("quick_add", &k.quick_add)?,
            edit: parse("edit", &k.edit)?,
            delete: parse("delete", &k.delete)?,
            grab: parse("grab", &k.grab)?,
            toggle: parse("toggle", &k.toggle)?,
            prev_week: parse("prev_week", &k.prev_week)?,
            next_week: parse("next_week", &k.next_week)?,
            today: parse("today", &k.today)?,
            class_preset: parse("class_preset", &k.class_preset)?,
            assignment_preset: parse("assignment_preset", &k.assignment_preset)?,
            exam_preset: parse("exam_preset", &k.exam_preset)?,
            study_preset: parse("study_preset", &k.study_preset)?,
            cycle_priority: parse("cycle_priority", &k.cycle_priority)?,
            cycle_status: parse("cycle_status", &k.cycle_status)?,
            cycle_sort: parse("cycle_sort", &k.cycle_sort)?,
            search: parse("search", &k.search)?,
            help: parse("help", &k.help)?,
            tabs: [
                parse("tab_1", &k.tab_1)?,
                parse("tab_2", &k.tab_2)?,
                parse("tab_3", &k.tab_3)?,
                parse("tab_4", &k.tab_4)?,
            ],
        })
    }
}

/// Cell cursor on the week grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridCursor {
    pub day: usize,
    pub slot: usize,
    /// Which of the cell's events is selected
    pub item: usize,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
    pub cursor: GridCursor,
    /// First grid row drawn; kept so the cursor stays visible
    pub grid_scroll: usize,
    /// Event id being moved with the keyboard
    pub grabbed: Option<String>,
    pub task_list: ListState,
    pub notebook_list: ListState,
    pub sticky_list: ListState,
    pub form_field: usize,
    pub delete_selection: usize,
    pub detail_scroll: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub planner: Planner,
    pub keys: KeyMap,
    pub ui: UiState,
    pub status: StatusState,
    /// Week projection, rebuilt after every change and on each refresh tick
    pub grid: WeekGrid,
    last_refresh: Instant,
    refresh_interval: Duration,
}

impl App {
    pub fn new(config: Config, planner: Planner) -> Result<Self, TuiError> {
        let keys = KeyMap::from_config(&config)?;
        let now = planner.now();
        let cursor = GridCursor {
            day: now.weekday().num_days_from_monday() as usize,
            slot: calendar::slot_for_hour(now.hour() as u8),
            item: 0,
        };
        let grid = planner.week_grid();
        let refresh_interval = Duration::from_secs(config.refresh_interval_secs.max(1));

        let mut app = Self {
            config,
            planner,
            keys,
            ui: UiState {
                current_tab: Tab::Calendar,
                mode: Mode::View,
                cursor,
                grid_scroll: 0,
                grabbed: None,
                task_list: ListState::default(),
                notebook_list: ListState::default(),
                sticky_list: ListState::default(),
                form_field: 0,
                delete_selection: 0,
                detail_scroll: 0,
            },
            status: StatusState::default(),
            grid,
            last_refresh: Instant::now(),
            refresh_interval,
        };
        app.refresh();
        Ok(app)
    }

    /// Rebuild derived views from the store and the clock
    pub fn refresh(&mut self) {
        self.grid = self.planner.week_grid();
        self.last_refresh = Instant::now();

        let tasks = self.planner.visible_tasks().len();
        let board = self.planner.board();
        let (notebooks, stickies) = (board.notebooks.len(), board.sticky_notes.len());
        clamp_selection(&mut self.ui.task_list, tasks);
        clamp_selection(&mut self.ui.notebook_list, notebooks);
        clamp_selection(&mut self.ui.sticky_list, stickies);
    }

    /// Periodic work run once per loop iteration
    pub fn tick(&mut self) {
        self.check_status_message_timeout();
        if self.last_refresh.elapsed() >= self.refresh_interval {
            tracing::trace!("periodic refresh");
            self.refresh();
        }
    }

    /// Run a planner command and reflect the outcome on screen.
    /// Returns whether the command succeeded.
    pub fn dispatch(&mut self, command: Command) -> bool {
        let result = self.planner.dispatch(command);
        let ok = match result {
            Ok(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            // The form shows its own message
            Err(PlannerError::Validation(_)) => false,
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                self.set_status_message(e.to_string());
                false
            }
        };
        self.refresh();
        ok
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Opened(_) => self.ui.form_field = 0,
            Outcome::Saved { kind, created, .. } => {
                let verb = if created { "created" } else { "updated" };
                self.set_status_message(format!("{} {}", capitalize(kind.record_kind()), verb));
            }
            Outcome::DeleteRequested(_) => self.ui.delete_selection = 0,
            Outcome::Deleted { kind, .. } => {
                self.set_status_message(format!("{} deleted", capitalize(kind.record_kind())));
            }
            Outcome::Rescheduled(event) => {
                self.set_status_message(format!(
                    "Moved '{}' to {} {}",
                    event.title,
                    event.date,
                    calendar::format_hour(event.start_hour)
                ));
            }
            Outcome::TaskToggled { completed, .. } => {
                let msg = if completed { "Task completed" } else { "Task marked pending" };
                self.set_status_message(msg.to_string());
            }
            Outcome::Closed(_) | Outcome::DeleteCancelled | Outcome::ViewChanged => {}
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.ui.current_tab = tab;
        self.ui.mode = Mode::View;
        self.ui.detail_scroll = 0;
    }

    // Calendar

    pub fn cell_events(&self) -> &[PlacedEvent] {
        self.grid
            .days
            .get(self.ui.cursor.day)
            .map(|day| day.events_at(self.ui.cursor.slot))
            .unwrap_or(&[])
    }

    pub fn selected_event(&self) -> Option<&PlacedEvent> {
        let events = self.cell_events();
        if events.is_empty() {
            None
        } else {
            events.get(self.ui.cursor.item % events.len())
        }
    }

    pub fn move_cursor(&mut self, days: i32, slots: i32) {
        let cursor = &mut self.ui.cursor;
        cursor.day = step(cursor.day, days, DAYS_PER_WEEK);
        cursor.slot = step(cursor.slot, slots, SLOTS_PER_DAY);
        cursor.item = 0;
    }

    pub fn next_cell_item(&mut self) {
        self.ui.cursor.item = self.ui.cursor.item.wrapping_add(1);
    }

    /// Pick up the selected event, or drop the grabbed one on the cursor cell
    pub fn grab_or_drop(&mut self) {
        match self.ui.grabbed.take() {
            None => match self.selected_event() {
                Some(placed) => {
                    let (id, title) = (placed.event.id.clone(), placed.event.title.clone());
                    self.ui.grabbed = Some(id);
                    self.set_status_message(format!("Moving '{}': pick a slot and press grab again", title));
                }
                None => self.set_status_message("No event here to move".to_string()),
            },
            Some(id) => {
                let Some((date, hour)) = self.grid.cell_target(self.ui.cursor.day, self.ui.cursor.slot)
                else {
                    return;
                };
                self.dispatch(Command::Reschedule { id, date, hour });
            }
        }
    }

    pub fn cancel_grab(&mut self) {
        if self.ui.grabbed.take().is_some() {
            self.set_status_message("Move cancelled".to_string());
        }
    }

    /// Enter on a cell: edit its event, or create one at that slot
    pub fn activate_cell(&mut self) {
        let command = match self.selected_event() {
            Some(placed) => Command::OpenEdit {
                kind: ModalKind::Event,
                id: placed.event.id.clone(),
            },
            None => {
                let Some((date, hour)) =
                    self.grid.cell_target(self.ui.cursor.day, self.ui.cursor.slot)
                else {
                    return;
                };
                Command::OpenEventAtSlot { date, hour }
            }
        };
        self.dispatch(command);
    }

    /// After a week change the cursor keeps its column and row
    pub fn go_to_current_week(&mut self) {
        self.dispatch(Command::CurrentWeek);
        let now = self.planner.now();
        self.ui.cursor.day = now.weekday().num_days_from_monday() as usize;
        self.ui.cursor.slot = calendar::slot_for_hour(now.hour() as u8);
    }

    // Lists

    fn current_list(&mut self) -> Option<(&mut ListState, usize)> {
        match self.ui.current_tab {
            Tab::Calendar => None,
            Tab::Tasks => {
                let len = self.planner.visible_tasks().len();
                Some((&mut self.ui.task_list, len))
            }
            Tab::Notebooks => {
                let len = self.planner.board().notebooks.len();
                Some((&mut self.ui.notebook_list, len))
            }
            Tab::StickyNotes => {
                let len = self.planner.board().sticky_notes.len();
                Some((&mut self.ui.sticky_list, len))
            }
        }
    }

    pub fn move_selection(&mut self, delta: i32) {
        let Some((state, len)) = self.current_list() else {
            return;
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0);
        state.select(Some(step(current, delta, len)));
        self.ui.detail_scroll = 0;
    }

    pub fn selected_task_id(&self) -> Option<String> {
        let index = self.ui.task_list.selected()?;
        self.planner
            .visible_tasks()
            .get(index)
            .map(|task| task.id.clone())
    }

    pub fn selected_notebook_id(&self) -> Option<String> {
        let index = self.ui.notebook_list.selected()?;
        self.planner
            .board()
            .notebooks
            .get(index)
            .map(|notebook| notebook.id.clone())
    }

    pub fn selected_sticky_id(&self) -> Option<String> {
        let index = self.ui.sticky_list.selected()?;
        self.planner
            .board()
            .sticky_notes
            .get(index)
            .map(|note| note.id.clone())
    }

    /// Record kind and id under the cursor on the current tab
    pub fn selected_record(&self) -> Option<(ModalKind, String)> {
        match self.ui.current_tab {
            Tab::Calendar => self
                .selected_event()
                .map(|placed| (ModalKind::Event, placed.event.id.clone())),
            Tab::Tasks => self.selected_task_id().map(|id| (ModalKind::Task, id)),
            Tab::Notebooks => self.selected_notebook_id().map(|id| (ModalKind::Notebook, id)),
            Tab::StickyNotes => self.selected_sticky_id().map(|id| (ModalKind::Sticky, id)),
        }
    }

    /// Form kind created by "new" on the current tab
    pub fn tab_kind(&self) -> ModalKind {
        match self.ui.current_tab {
            Tab::Calendar => ModalKind::Event,
            Tab::Tasks => ModalKind::Task,
            Tab::Notebooks => ModalKind::Notebook,
            Tab::StickyNotes => ModalKind::Sticky,
        }
    }

    // Search

    pub fn enter_search_mode(&mut self) {
        self.ui.mode = Mode::Search;
    }

    pub fn exit_search_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn add_to_search(&mut self, ch: char) {
        let mut query = self.planner.note_search().to_string();
        query.push(ch);
        self.dispatch(Command::SearchNotes(query));
    }

    pub fn remove_from_search(&mut self) {
        let mut query = self.planner.note_search().to_string();
        query.pop();
        self.dispatch(Command::SearchNotes(query));
    }

    // Forms

    pub fn form_field_count(&self) -> usize {
        match self.planner.open_modal() {
            Some(ModalKind::Event) => <crate::controller::EventDraft as FormFields>::LABELS.len(),
            Some(ModalKind::Task) => <crate::controller::TaskDraft as FormFields>::LABELS.len(),
            Some(ModalKind::Notebook) => {
                <crate::controller::NotebookDraft as FormFields>::LABELS.len()
            }
            Some(ModalKind::Sticky) => <crate::controller::StickyDraft as FormFields>::LABELS.len(),
            None => 0,
        }
    }

    pub fn navigate_form_field(&mut self, forward: bool) {
        let count = self.form_field_count();
        if count > 0 {
            self.ui.form_field = step(self.ui.form_field, if forward { 1 } else { -1 }, count);
        }
    }

    pub fn edit_form(&mut self, edit: FormEdit) {
        let field = self.ui.form_field;
        match self.planner.open_modal() {
            Some(ModalKind::Event) => {
                if let Some(form) = self.planner.event_modal.form_mut() {
                    apply_edit(&mut form.draft, field, edit);
                }
            }
            Some(ModalKind::Task) => {
                if let Some(form) = self.planner.task_modal.form_mut() {
                    apply_edit(&mut form.draft, field, edit);
                }
            }
            Some(ModalKind::Notebook) => {
                if let Some(form) = self.planner.notebook_modal.form_mut() {
                    apply_edit(&mut form.draft, field, edit);
                }
            }
            Some(ModalKind::Sticky) => {
                if let Some(form) = self.planner.sticky_modal.form_mut() {
                    apply_edit(&mut form.draft, field, edit);
                }
            }
            None => {}
        }
    }

    /// Semester progress percent, when a semester is configured
    pub fn semester_progress(&self) -> Option<u8> {
        let (start, end) = self.config.semester()?;
        Some(calendar::semester_progress(start, end, self.planner.today()))
    }
}

fn apply_edit<D: FormFields>(draft: &mut D, field: usize, edit: FormEdit) {
    match edit {
        FormEdit::Insert(c) => draft.insert_char(field, c),
        FormEdit::Backspace => draft.backspace(field),
        FormEdit::Cycle { forward } => draft.cycle(field, forward),
    }
}

/// Move `current` by `delta` within `0..len`, wrapping at both ends
fn step(current: usize, delta: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    (current as i64 + delta as i64).rem_euclid(len) as usize
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), len) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
