use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use thiserror::Error;

use crate::calendar::{self, RescheduleError, WeekGrid};
use crate::models::{
    DEFAULT_COLOR, Event, EventType, Notebook, Priority, StickyNote, Task,
};
use crate::notes::{self, BoardView};
use crate::store::{EntityStore, Record, StoreError};
use crate::tasks::{PriorityFilter, SortKey, StatusFilter, TaskQuery};
use crate::utils::{format_date, parse_date};

/// Start hour used when the event form opens without a target cell
const DEFAULT_START_HOUR: u8 = 9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a title")]
    MissingTitle,
    #[error("Please enter a valid date (YYYY-MM-DD), got '{0}'")]
    InvalidDate(String),
    #[error("Please choose a valid hour, got '{0}'")]
    InvalidHour(String),
    #[error("End time must be after start time")]
    EndNotAfterStart,
    #[error("End time cannot be later than midnight")]
    EndPastMidnight,
    #[error("Please choose a due date")]
    MissingDueDate,
    #[error("Please choose a priority")]
    MissingPriority,
    #[error("Please enter some content")]
    MissingContent,
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Cannot move event: {0}")]
    Reschedule(#[from] RescheduleError),
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("The {0} form is not open")]
    ModalClosed(ModalKind),
    #[error("Nothing is waiting to be deleted")]
    NoPendingDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKind {
    Event,
    Task,
    Notebook,
    Sticky,
}

impl ModalKind {
    pub fn record_kind(&self) -> &'static str {
        match self {
            ModalKind::Event => Event::KIND,
            ModalKind::Task => Task::KIND,
            ModalKind::Notebook => Notebook::KIND,
            ModalKind::Sticky => StickyNote::KIND,
        }
    }
}

impl fmt::Display for ModalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.record_kind())
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_title(value: &str) -> Result<String, ValidationError> {
    optional(value).ok_or(ValidationError::MissingTitle)
}

fn colour_or_default(value: &str) -> String {
    optional(value).unwrap_or_else(|| DEFAULT_COLOR.to_string())
}

/// Editable form contents for a record kind
pub trait Draft: Sized {
    type Record: Record;

    /// Pre-fill a draft from an existing record
    fn from_record(record: &Self::Record) -> Self;

    /// Validate and produce the record to store under `id`. Fields the form
    /// does not expose are carried over from `existing`.
    fn build(&self, id: String, existing: Option<&Self::Record>)
    -> Result<Self::Record, ValidationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub start_hour: String,
    pub end_hour: String,
    pub color: String,
    pub description: String,
    pub recurring: String,
    pub event_type: EventType,
}

impl EventDraft {
    /// Blank draft covering one hour from `start_hour` on `date`
    pub fn at(date: NaiveDate, start_hour: u8) -> Self {
        let start_hour = start_hour.min(23);
        Self {
            title: String::new(),
            date: format_date(date),
            start_hour: start_hour.to_string(),
            end_hour: (start_hour + 1).to_string(),
            color: DEFAULT_COLOR.to_string(),
            description: String::new(),
            recurring: "none".to_string(),
            event_type: EventType::default(),
        }
    }

    /// Draft for a type preset, with the preset's default title
    pub fn preset(event_type: EventType, date: NaiveDate) -> Self {
        let mut draft = Self::at(date, DEFAULT_START_HOUR);
        draft.event_type = event_type;
        if let Some(title) = event_type.default_title() {
            draft.title = title.to_string();
        }
        draft
    }

    /// Change the start hour; a parsable start moves the end to one hour later
    pub fn set_start_hour(&mut self, value: String) {
        if let Ok(start) = value.trim().parse::<u8>() {
            if start < 24 {
                self.end_hour = (start + 1).to_string();
            }
        }
        self.start_hour = value;
    }
}

fn parse_hour(value: &str) -> Result<u8, ValidationError> {
    value
        .trim()
        .parse::<u8>()
        .map_err(|_| ValidationError::InvalidHour(value.to_string()))
}

impl Draft for EventDraft {
    type Record = Event;

    fn from_record(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            date: event.date.clone(),
            start_hour: event.start_hour.to_string(),
            end_hour: event.end_hour.to_string(),
            color: event.color.clone(),
            description: event.description.clone().unwrap_or_default(),
            recurring: event.recurring.clone().unwrap_or_else(|| "none".to_string()),
            event_type: event.event_type,
        }
    }

    fn build(&self, id: String, existing: Option<&Event>) -> Result<Event, ValidationError> {
        let title = required_title(&self.title)?;
        let date = parse_date(&self.date)
            .map_err(|_| ValidationError::InvalidDate(self.date.clone()))?;

        let start_hour = parse_hour(&self.start_hour)?;
        if start_hour > 23 {
            return Err(ValidationError::InvalidHour(self.start_hour.clone()));
        }
        let end_hour = parse_hour(&self.end_hour)?;
        if end_hour > 24 {
            return Err(ValidationError::EndPastMidnight);
        }
        if end_hour <= start_hour {
            return Err(ValidationError::EndNotAfterStart);
        }

        let mut event = Event::new(id, title, format_date(date), start_hour, end_hour);
        event.color = colour_or_default(&self.color);
        event.description = optional(&self.description);
        event.recurring = optional(&self.recurring).filter(|r| r != "none");
        event.event_type = self.event_type;
        if let Some(existing) = existing {
            event.created_at = existing.created_at.clone();
        }
        Ok(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub course: String,
    pub due_date: String,
    pub priority: Option<Priority>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            course: String::new(),
            due_date: String::new(),
            priority: Some(Priority::Medium),
        }
    }
}

impl TaskDraft {
    pub fn due_on(date: NaiveDate) -> Self {
        Self {
            due_date: format_date(date),
            ..Self::default()
        }
    }
}

impl Draft for TaskDraft {
    type Record = Task;

    fn from_record(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            course: task.course.clone().unwrap_or_default(),
            due_date: task.due_date.clone().unwrap_or_default(),
            priority: Some(task.priority),
        }
    }

    fn build(&self, id: String, existing: Option<&Task>) -> Result<Task, ValidationError> {
        let title = required_title(&self.title)?;
        if self.due_date.trim().is_empty() {
            return Err(ValidationError::MissingDueDate);
        }
        let due = parse_date(&self.due_date)
            .map_err(|_| ValidationError::InvalidDate(self.due_date.clone()))?;
        let priority = self.priority.ok_or(ValidationError::MissingPriority)?;

        let mut task = Task::new(id, title, priority);
        task.description = optional(&self.description);
        task.course = optional(&self.course);
        task.due_date = Some(format_date(due));
        if let Some(existing) = existing {
            task.completed = existing.completed;
            task.created_at = existing.created_at.clone();
        }
        Ok(task)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookDraft {
    pub title: String,
    pub subject: String,
    pub color: String,
    pub description: String,
}

impl Default for NotebookDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            subject: String::new(),
            color: DEFAULT_COLOR.to_string(),
            description: String::new(),
        }
    }
}

impl Draft for NotebookDraft {
    type Record = Notebook;

    fn from_record(notebook: &Notebook) -> Self {
        Self {
            title: notebook.title.clone(),
            subject: notebook.subject.clone().unwrap_or_default(),
            color: notebook.color.clone(),
            description: notebook.description.clone().unwrap_or_default(),
        }
    }

    fn build(&self, id: String, existing: Option<&Notebook>) -> Result<Notebook, ValidationError> {
        let mut notebook = Notebook::new(id, required_title(&self.title)?);
        notebook.subject = optional(&self.subject);
        notebook.color = colour_or_default(&self.color);
        notebook.description = optional(&self.description);
        if let Some(existing) = existing {
            notebook.page_count = existing.page_count;
            notebook.created_at = existing.created_at.clone();
        }
        Ok(notebook)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyDraft {
    pub title: String,
    pub content: String,
    pub color: String,
}

impl Default for StickyDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl Draft for StickyDraft {
    type Record = StickyNote;

    fn from_record(note: &StickyNote) -> Self {
        Self {
            title: note.title.clone().unwrap_or_default(),
            content: note.content.clone(),
            color: note.color.clone(),
        }
    }

    fn build(&self, id: String, existing: Option<&StickyNote>) -> Result<StickyNote, ValidationError> {
        // Content keeps its inner line breaks; only blank content is rejected
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingContent);
        }
        let mut note = StickyNote::new(id, self.content.trim_end().to_string());
        note.title = optional(&self.title);
        note.color = colour_or_default(&self.color);
        if let Some(existing) = existing {
            note.created_at = existing.created_at.clone();
        }
        Ok(note)
    }
}

/// An open form: the draft, the id being edited (none when creating) and
/// the last validation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form<D> {
    pub draft: D,
    pub editing: Option<String>,
    pub error: Option<String>,
}

impl<D> Form<D> {
    fn create(draft: D) -> Self {
        Self {
            draft,
            editing: None,
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal<D> {
    Closed,
    Open(Form<D>),
}

impl<D> Default for Modal<D> {
    fn default() -> Self {
        Modal::Closed
    }
}

impl<D> Modal<D> {
    pub fn is_open(&self) -> bool {
        matches!(self, Modal::Open(_))
    }

    pub fn form(&self) -> Option<&Form<D>> {
        match self {
            Modal::Open(form) => Some(form),
            Modal::Closed => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut Form<D>> {
        match self {
            Modal::Open(form) => Some(form),
            Modal::Closed => None,
        }
    }
}

/// A delete waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub kind: ModalKind,
    pub id: String,
    pub label: String,
}

/// Every user action the planner understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenCreate(ModalKind),
    OpenEventPreset(EventType),
    /// Event form for today at the current hour
    QuickAddEvent,
    OpenEventAtSlot { date: NaiveDate, hour: u8 },
    OpenEdit { kind: ModalKind, id: String },
    Cancel(ModalKind),
    Submit(ModalKind),
    RequestDelete { kind: ModalKind, id: String },
    ConfirmDelete,
    CancelDelete,
    Reschedule { id: String, date: NaiveDate, hour: u8 },
    ToggleTask(String),
    SetPriorityFilter(PriorityFilter),
    SetStatusFilter(StatusFilter),
    SetSort(SortKey),
    PreviousWeek,
    NextWeek,
    CurrentWeek,
    SearchNotes(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Opened(ModalKind),
    Closed(ModalKind),
    Saved {
        kind: ModalKind,
        id: String,
        created: bool,
    },
    DeleteRequested(PendingDelete),
    Deleted { kind: ModalKind, id: String },
    DeleteCancelled,
    Rescheduled(Event),
    TaskToggled { id: String, completed: bool },
    ViewChanged,
}

/// Interaction state of the planner on top of the [`EntityStore`]
pub struct Planner {
    store: EntityStore,
    clock: fn() -> NaiveDateTime,
    week_start: NaiveDate,
    task_query: TaskQuery,
    note_search: String,
    pending_delete: Option<PendingDelete>,
    pub event_modal: Modal<EventDraft>,
    pub task_modal: Modal<TaskDraft>,
    pub notebook_modal: Modal<NotebookDraft>,
    pub sticky_modal: Modal<StickyDraft>,
}

impl Planner {
    pub fn new(store: EntityStore) -> Self {
        Self::with_clock(store, crate::utils::now)
    }

    /// Planner reading "now" from `clock`
    pub fn with_clock(store: EntityStore, clock: fn() -> NaiveDateTime) -> Self {
        Self {
            store,
            clock,
            week_start: calendar::start_of_week(clock().date()),
            task_query: TaskQuery::default(),
            note_search: String::new(),
            pending_delete: None,
            event_modal: Modal::Closed,
            task_modal: Modal::Closed,
            notebook_modal: Modal::Closed,
            sticky_modal: Modal::Closed,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn task_query(&self) -> TaskQuery {
        self.task_query
    }

    pub fn note_search(&self) -> &str {
        &self.note_search
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    /// The first open modal, if any
    pub fn open_modal(&self) -> Option<ModalKind> {
        if self.event_modal.is_open() {
            Some(ModalKind::Event)
        } else if self.task_modal.is_open() {
            Some(ModalKind::Task)
        } else if self.notebook_modal.is_open() {
            Some(ModalKind::Notebook)
        } else if self.sticky_modal.is_open() {
            Some(ModalKind::Sticky)
        } else {
            None
        }
    }

    /// Current week projection. Pure in the store contents and the clock.
    pub fn week_grid(&self) -> WeekGrid {
        WeekGrid::build(self.store.events(), self.week_start, self.now())
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.task_query.apply(self.store.tasks())
    }

    pub fn board(&self) -> BoardView<'_> {
        notes::search(
            self.store.notebooks(),
            self.store.sticky_notes(),
            &self.note_search,
        )
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, PlannerError> {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::OpenCreate(kind) => {
                let today = self.today();
                match kind {
                    ModalKind::Event => {
                        self.event_modal =
                            Modal::Open(Form::create(EventDraft::at(today, DEFAULT_START_HOUR)))
                    }
                    ModalKind::Task => {
                        self.task_modal = Modal::Open(Form::create(TaskDraft::due_on(today)))
                    }
                    ModalKind::Notebook => {
                        self.notebook_modal = Modal::Open(Form::create(NotebookDraft::default()))
                    }
                    ModalKind::Sticky => {
                        self.sticky_modal = Modal::Open(Form::create(StickyDraft::default()))
                    }
                }
                Ok(Outcome::Opened(kind))
            }
            Command::OpenEventPreset(event_type) => {
                let draft = EventDraft::preset(event_type, self.today());
                self.event_modal = Modal::Open(Form::create(draft));
                Ok(Outcome::Opened(ModalKind::Event))
            }
            Command::QuickAddEvent => {
                let now = self.now();
                // `hour()` is 0..=23 so the end stays within the day
                let hour = u8::try_from(now.hour()).unwrap_or(DEFAULT_START_HOUR);
                self.event_modal = Modal::Open(Form::create(EventDraft::at(now.date(), hour)));
                Ok(Outcome::Opened(ModalKind::Event))
            }
            Command::OpenEventAtSlot { date, hour } => {
                self.event_modal = Modal::Open(Form::create(EventDraft::at(date, hour)));
                Ok(Outcome::Opened(ModalKind::Event))
            }
            Command::OpenEdit { kind, id } => {
                match kind {
                    ModalKind::Event => open_edit(&self.store, &mut self.event_modal, &id)?,
                    ModalKind::Task => open_edit(&self.store, &mut self.task_modal, &id)?,
                    ModalKind::Notebook => open_edit(&self.store, &mut self.notebook_modal, &id)?,
                    ModalKind::Sticky => open_edit(&self.store, &mut self.sticky_modal, &id)?,
                }
                Ok(Outcome::Opened(kind))
            }
            Command::Cancel(kind) => {
                match kind {
                    ModalKind::Event => self.event_modal = Modal::Closed,
                    ModalKind::Task => self.task_modal = Modal::Closed,
                    ModalKind::Notebook => self.notebook_modal = Modal::Closed,
                    ModalKind::Sticky => self.sticky_modal = Modal::Closed,
                }
                Ok(Outcome::Closed(kind))
            }
            Command::Submit(kind) => match kind {
                ModalKind::Event => submit(&mut self.store, &mut self.event_modal, kind),
                ModalKind::Task => submit(&mut self.store, &mut self.task_modal, kind),
                ModalKind::Notebook => submit(&mut self.store, &mut self.notebook_modal, kind),
                ModalKind::Sticky => submit(&mut self.store, &mut self.sticky_modal, kind),
            },
            Command::RequestDelete { kind, id } => {
                let label = self.record_label(kind, &id).ok_or_else(|| PlannerError::NotFound {
                    kind: kind.record_kind(),
                    id: id.clone(),
                })?;
                let pending = PendingDelete { kind, id, label };
                self.pending_delete = Some(pending.clone());
                Ok(Outcome::DeleteRequested(pending))
            }
            Command::ConfirmDelete => {
                let PendingDelete { kind, id, .. } =
                    self.pending_delete.take().ok_or(PlannerError::NoPendingDelete)?;
                self.close_if_editing(kind, &id);
                match kind {
                    ModalKind::Event => self.store.remove::<Event>(&id)?,
                    ModalKind::Task => self.store.remove::<Task>(&id)?,
                    ModalKind::Notebook => self.store.remove::<Notebook>(&id)?,
                    ModalKind::Sticky => self.store.remove::<StickyNote>(&id)?,
                }
                Ok(Outcome::Deleted { kind, id })
            }
            Command::CancelDelete => {
                self.pending_delete = None;
                Ok(Outcome::DeleteCancelled)
            }
            Command::Reschedule { id, date, hour } => {
                let event = self
                    .store
                    .find_by_id::<Event>(&id)
                    .ok_or_else(|| PlannerError::NotFound {
                        kind: Event::KIND,
                        id: id.clone(),
                    })?;
                let moved = calendar::reschedule(event, date, hour)?;
                self.store.upsert(moved.clone())?;
                Ok(Outcome::Rescheduled(moved))
            }
            Command::ToggleTask(id) => {
                let completed = self.store.toggle_task(&id)?;
                Ok(Outcome::TaskToggled { id, completed })
            }
            Command::SetPriorityFilter(priority) => {
                self.task_query.priority = priority;
                Ok(Outcome::ViewChanged)
            }
            Command::SetStatusFilter(status) => {
                self.task_query.status = status;
                Ok(Outcome::ViewChanged)
            }
            Command::SetSort(sort) => {
                self.task_query.sort = sort;
                Ok(Outcome::ViewChanged)
            }
            Command::PreviousWeek => {
                self.week_start -= chrono::Duration::days(7);
                Ok(Outcome::ViewChanged)
            }
            Command::NextWeek => {
                self.week_start += chrono::Duration::days(7);
                Ok(Outcome::ViewChanged)
            }
            Command::CurrentWeek => {
                self.week_start = calendar::start_of_week(self.today());
                Ok(Outcome::ViewChanged)
            }
            Command::SearchNotes(query) => {
                self.note_search = query;
                Ok(Outcome::ViewChanged)
            }
        }
    }

    fn record_label(&self, kind: ModalKind, id: &str) -> Option<String> {
        match kind {
            ModalKind::Event => self.store.find_by_id::<Event>(id).map(|e| e.title.clone()),
            ModalKind::Task => self.store.find_by_id::<Task>(id).map(|t| t.title.clone()),
            ModalKind::Notebook => self
                .store
                .find_by_id::<Notebook>(id)
                .map(|n| n.title.clone()),
            ModalKind::Sticky => self.store.find_by_id::<StickyNote>(id).map(|s| {
                s.title
                    .clone()
                    .unwrap_or_else(|| s.content.lines().next().unwrap_or_default().to_string())
            }),
        }
    }

    /// Deleting the record behind an open edit form closes that form
    fn close_if_editing(&mut self, kind: ModalKind, id: &str) {
        fn editing<D>(modal: &Modal<D>, id: &str) -> bool {
            modal
                .form()
                .is_some_and(|form| form.editing.as_deref() == Some(id))
        }
        match kind {
            ModalKind::Event if editing(&self.event_modal, id) => self.event_modal = Modal::Closed,
            ModalKind::Task if editing(&self.task_modal, id) => self.task_modal = Modal::Closed,
            ModalKind::Notebook if editing(&self.notebook_modal, id) => {
                self.notebook_modal = Modal::Closed
            }
            ModalKind::Sticky if editing(&self.sticky_modal, id) => {
                self.sticky_modal = Modal::Closed
            }
            _ => {}
        }
    }
}

fn open_edit<D: Draft>(
    store: &EntityStore,
    modal: &mut Modal<D>,
    id: &str,
) -> Result<(), PlannerError> {
    let record = store
        .find_by_id::<D::Record>(id)
        .ok_or_else(|| PlannerError::NotFound {
            kind: D::Record::KIND,
            id: id.to_string(),
        })?;
    *modal = Modal::Open(Form {
        draft: D::from_record(record),
        editing: Some(id.to_string()),
        error: None,
    });
    Ok(())
}

/// Validate the open form and upsert its record. Invalid input keeps the
/// form open with the message; a failed write-through still closes it since
/// the in-memory change has been applied.
fn submit<D: Draft>(
    store: &mut EntityStore,
    modal: &mut Modal<D>,
    kind: ModalKind,
) -> Result<Outcome, PlannerError> {
    let Modal::Open(form) = modal else {
        return Err(PlannerError::ModalClosed(kind));
    };

    let id = match &form.editing {
        Some(id) => id.clone(),
        None => store.mint_id::<D::Record>(),
    };
    let existing = form
        .editing
        .as_deref()
        .and_then(|editing| store.find_by_id::<D::Record>(editing));

    let record = match form.draft.build(id.clone(), existing) {
        Ok(record) => record,
        Err(e) => {
            tracing::debug!(%kind, error = %e, "form rejected");
            form.error = Some(e.to_string());
            return Err(e.into());
        }
    };
    let created = form.editing.is_none();

    *modal = Modal::Closed;
    store.upsert(record)?;
    Ok(Outcome::Saved { kind, id, created })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageGateway};
    use pretty_assertions::assert_eq;

    fn fixed_now() -> NaiveDateTime {
        // Wednesday
        parse_date("2024-06-12")
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn planner() -> Planner {
        let store = EntityStore::load(StorageGateway::new(Box::new(MemoryStore::new())));
        Planner::with_clock(store, fixed_now)
    }

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn fill_event(planner: &mut Planner, title: &str, day: &str, start: &str, end: &str) {
        let form = planner.event_modal.form_mut().unwrap();
        form.draft.title = title.to_string();
        form.draft.date = day.to_string();
        form.draft.start_hour = start.to_string();
        form.draft.end_hour = end.to_string();
    }

    fn create_event(planner: &mut Planner, day: &str, start: &str, end: &str) -> String {
        planner
            .dispatch(Command::OpenCreate(ModalKind::Event))
            .unwrap();
        fill_event(planner, "Lecture", day, start, end);
        match planner.dispatch(Command::Submit(ModalKind::Event)).unwrap() {
            Outcome::Saved { id, created, .. } => {
                assert!(created);
                id
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn invalid_end_hour_keeps_modal_open() {
        let mut planner = planner();
        planner
            .dispatch(Command::OpenCreate(ModalKind::Event))
            .unwrap();
        fill_event(&mut planner, "Lecture", "2024-06-12", "11", "11");

        let result = planner.dispatch(Command::Submit(ModalKind::Event));
        assert!(matches!(
            result,
            Err(PlannerError::Validation(ValidationError::EndNotAfterStart))
        ));
        assert!(planner.event_modal.is_open());
        assert_eq!(
            planner.event_modal.form().unwrap().error.as_deref(),
            Some("End time must be after start time")
        );
        assert!(planner.store().events().is_empty());
    }

    #[test]
    fn event_validation_messages() {
        let today = date("2024-06-12");
        let mut draft = EventDraft::at(today, 9);
        assert_eq!(
            draft.build("1".into(), None),
            Err(ValidationError::MissingTitle)
        );
        draft.title = "Lab".into();
        draft.date = "June 12".into();
        assert!(matches!(
            draft.build("1".into(), None),
            Err(ValidationError::InvalidDate(_))
        ));
        draft.date = "2024-06-12".into();
        draft.end_hour = "25".into();
        assert_eq!(
            draft.build("1".into(), None),
            Err(ValidationError::EndPastMidnight)
        );
        draft.end_hour = "ten".into();
        assert!(matches!(
            draft.build("1".into(), None),
            Err(ValidationError::InvalidHour(_))
        ));
    }

    #[test]
    fn create_then_edit_keeps_position_and_created_at() {
        let mut planner = planner();
        let first = create_event(&mut planner, "2024-06-10", "9", "11");
        let second = create_event(&mut planner, "2024-06-11", "13", "14");
        let created_at = planner.store().events()[0].created_at.clone();

        planner
            .dispatch(Command::OpenEdit {
                kind: ModalKind::Event,
                id: first.clone(),
            })
            .unwrap();
        let form = planner.event_modal.form_mut().unwrap();
        assert_eq!(form.editing.as_deref(), Some(first.as_str()));
        form.draft.title = "Seminar".to_string();
        let outcome = planner.dispatch(Command::Submit(ModalKind::Event)).unwrap();

        assert_eq!(
            outcome,
            Outcome::Saved {
                kind: ModalKind::Event,
                id: first.clone(),
                created: false
            }
        );
        let events = planner.store().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, first);
        assert_eq!(events[0].title, "Seminar");
        assert_eq!(events[0].created_at, created_at);
        assert_eq!(events[1].id, second);
        assert!(!planner.event_modal.is_open());
    }

    #[test]
    fn reschedule_keeps_duration() {
        let mut planner = planner();
        let id = create_event(&mut planner, "2024-06-10", "9", "11");

        let outcome = planner
            .dispatch(Command::Reschedule {
                id: id.clone(),
                date: date("2024-06-14"),
                hour: 14,
            })
            .unwrap();
        let Outcome::Rescheduled(moved) = outcome else {
            panic!("expected a rescheduled event");
        };
        assert_eq!((moved.start_hour, moved.end_hour), (14, 16));

        let stored = planner.store().find_by_id::<Event>(&id).unwrap();
        assert_eq!(stored.date, "2024-06-14");
        assert_eq!((stored.start_hour, stored.end_hour), (14, 16));
    }

    #[test]
    fn reschedule_past_midnight_is_rejected() {
        let mut planner = planner();
        let id = create_event(&mut planner, "2024-06-10", "9", "12");
        let result = planner.dispatch(Command::Reschedule {
            id: id.clone(),
            date: date("2024-06-10"),
            hour: 23,
        });
        assert!(matches!(result, Err(PlannerError::Reschedule(_))));
        assert_eq!(planner.store().events()[0].start_hour, 9);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut planner = planner();
        let id = create_event(&mut planner, "2024-06-10", "9", "11");

        let outcome = planner
            .dispatch(Command::RequestDelete {
                kind: ModalKind::Event,
                id: id.clone(),
            })
            .unwrap();
        assert!(matches!(outcome, Outcome::DeleteRequested(ref p) if p.label == "Lecture"));
        assert_eq!(planner.store().events().len(), 1);

        planner.dispatch(Command::CancelDelete).unwrap();
        assert!(matches!(
            planner.dispatch(Command::ConfirmDelete),
            Err(PlannerError::NoPendingDelete)
        ));
        assert_eq!(planner.store().events().len(), 1);

        planner
            .dispatch(Command::RequestDelete {
                kind: ModalKind::Event,
                id: id.clone(),
            })
            .unwrap();
        planner.dispatch(Command::ConfirmDelete).unwrap();
        assert!(planner.store().events().is_empty());
    }

    #[test]
    fn presets_and_quick_add_prefill_the_draft() {
        let mut planner = planner();
        planner
            .dispatch(Command::OpenEventPreset(EventType::Exam))
            .unwrap();
        let draft = &planner.event_modal.form().unwrap().draft;
        assert_eq!(draft.title, "New Exam");
        assert_eq!(draft.event_type, EventType::Exam);

        planner.dispatch(Command::QuickAddEvent).unwrap();
        let draft = &planner.event_modal.form().unwrap().draft;
        assert_eq!(draft.date, "2024-06-12");
        assert_eq!((draft.start_hour.as_str(), draft.end_hour.as_str()), ("10", "11"));
    }

    #[test]
    fn start_change_moves_end() {
        let mut draft = EventDraft::at(date("2024-06-12"), 9);
        draft.set_start_hour("15".to_string());
        assert_eq!(draft.end_hour, "16");
        draft.set_start_hour("x".to_string());
        assert_eq!(draft.end_hour, "16");
    }

    #[test]
    fn task_form_requires_due_date_and_priority() {
        let mut planner = planner();
        planner.dispatch(Command::OpenCreate(ModalKind::Task)).unwrap();
        let form = planner.task_modal.form_mut().unwrap();
        form.draft.title = "Essay".to_string();
        form.draft.due_date = String::new();
        assert!(matches!(
            planner.dispatch(Command::Submit(ModalKind::Task)),
            Err(PlannerError::Validation(ValidationError::MissingDueDate))
        ));

        let form = planner.task_modal.form_mut().unwrap();
        form.draft.due_date = "2024-06-20".to_string();
        form.draft.priority = None;
        assert!(matches!(
            planner.dispatch(Command::Submit(ModalKind::Task)),
            Err(PlannerError::Validation(ValidationError::MissingPriority))
        ));

        planner.task_modal.form_mut().unwrap().draft.priority = Some(Priority::High);
        planner.dispatch(Command::Submit(ModalKind::Task)).unwrap();
        assert_eq!(planner.store().tasks().len(), 1);
        assert_eq!(planner.store().tasks()[0].due_date.as_deref(), Some("2024-06-20"));
    }

    #[test]
    fn editing_a_task_keeps_completion() {
        let mut planner = planner();
        planner.dispatch(Command::OpenCreate(ModalKind::Task)).unwrap();
        planner.task_modal.form_mut().unwrap().draft.title = "Read".to_string();
        let Outcome::Saved { id, .. } = planner.dispatch(Command::Submit(ModalKind::Task)).unwrap()
        else {
            panic!("expected save");
        };
        planner.dispatch(Command::ToggleTask(id.clone())).unwrap();

        planner
            .dispatch(Command::OpenEdit {
                kind: ModalKind::Task,
                id: id.clone(),
            })
            .unwrap();
        planner.task_modal.form_mut().unwrap().draft.title = "Read ch. 4".to_string();
        planner.dispatch(Command::Submit(ModalKind::Task)).unwrap();

        let task = planner.store().find_by_id::<Task>(&id).unwrap();
        assert!(task.completed);
        assert_eq!(task.title, "Read ch. 4");
    }

    #[test]
    fn sticky_requires_content_and_notebooks_prepend() {
        let mut planner = planner();
        planner.dispatch(Command::OpenCreate(ModalKind::Sticky)).unwrap();
        assert!(matches!(
            planner.dispatch(Command::Submit(ModalKind::Sticky)),
            Err(PlannerError::Validation(ValidationError::MissingContent))
        ));
        assert!(planner.sticky_modal.is_open());

        for title in ["Math", "Art"] {
            planner
                .dispatch(Command::OpenCreate(ModalKind::Notebook))
                .unwrap();
            planner.notebook_modal.form_mut().unwrap().draft.title = title.to_string();
            planner.dispatch(Command::Submit(ModalKind::Notebook)).unwrap();
        }
        let titles: Vec<&str> = planner
            .store()
            .notebooks()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Art", "Math"]);
    }

    #[test]
    fn week_navigation() {
        let mut planner = planner();
        assert_eq!(planner.week_start(), date("2024-06-10"));
        planner.dispatch(Command::NextWeek).unwrap();
        assert_eq!(planner.week_start(), date("2024-06-17"));
        planner.dispatch(Command::PreviousWeek).unwrap();
        planner.dispatch(Command::PreviousWeek).unwrap();
        assert_eq!(planner.week_start(), date("2024-06-03"));
        planner.dispatch(Command::CurrentWeek).unwrap();
        assert_eq!(planner.week_start(), date("2024-06-10"));
        assert_eq!(planner.week_grid().range_label(), "June 10 - June 16, 2024");
    }

    #[test]
    fn submit_without_open_form_is_an_error() {
        let mut planner = planner();
        assert!(matches!(
            planner.dispatch(Command::Submit(ModalKind::Notebook)),
            Err(PlannerError::ModalClosed(ModalKind::Notebook))
        ));
    }
}
