use chrono::{NaiveDate, NaiveDateTime};
use lavender::controller::{EventDraft, ValidationError};
use lavender::storage::StorageError;
use lavender::tasks::{PriorityFilter, StatusFilter};
use lavender::{
    Command, EntityStore, Event, KeyValueStore, MemoryStore, ModalKind, Outcome, Planner,
    PlannerError, Priority, StorageGateway, Task,
};
use pretty_assertions::assert_eq;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// Wednesday of the week starting 2024-06-10
fn wednesday_morning() -> NaiveDateTime {
    date("2024-06-12").and_hms_opt(8, 15, 0).unwrap()
}

fn planner_with(store: EntityStore) -> Planner {
    Planner::with_clock(store, wednesday_morning)
}

fn planner() -> Planner {
    planner_with(EntityStore::load(StorageGateway::new(Box::new(MemoryStore::new()))))
}

fn fill_event(planner: &mut Planner, draft: EventDraft) {
    let form = planner.event_modal.form_mut().unwrap();
    form.draft = draft;
}

#[test]
fn end_before_start_keeps_modal_open_and_saves_nothing() {
    let mut planner = planner();
    planner.dispatch(Command::OpenCreate(ModalKind::Event)).unwrap();
    let mut draft = EventDraft::at(date("2024-06-12"), 10);
    draft.title = "Seminar".into();
    draft.end_hour = "10".into();
    fill_event(&mut planner, draft);

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
fn rescheduling_keeps_duration() {
    let mut planner = planner();
    planner.dispatch(Command::OpenCreate(ModalKind::Event)).unwrap();
    let mut draft = EventDraft::at(date("2024-06-11"), 9);
    draft.title = "Office hours".into();
    draft.end_hour = "11".into();
    fill_event(&mut planner, draft);
    let Outcome::Saved { id, created, .. } = planner.dispatch(Command::Submit(ModalKind::Event)).unwrap() else {
        panic!("expected a save");
    };
    assert!(created);

    let outcome = planner
        .dispatch(Command::Reschedule {
            id: id.clone(),
            date: date("2024-06-14"),
            hour: 14,
        })
        .unwrap();
    let Outcome::Rescheduled(moved) = outcome else {
        panic!("expected a reschedule");
    };
    assert_eq!((moved.date.as_str(), moved.start_hour, moved.end_hour), ("2024-06-14", 14, 16));
    assert_eq!(planner.store().find_by_id::<Event>(&id), Some(&moved));

    // Friday column, 14:00 row
    let grid = planner.week_grid();
    let placed = grid.days[4].events_at(lavender::calendar::slot_for_hour(14));
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].event.id, id);
}

#[test]
fn editing_replaces_in_place_and_keeps_completion() {
    let mut planner = planner();
    for title in ["First", "Second"] {
        planner.dispatch(Command::OpenCreate(ModalKind::Task)).unwrap();
        planner.task_modal.form_mut().unwrap().draft.title = title.into();
        planner.dispatch(Command::Submit(ModalKind::Task)).unwrap();
    }
    let first = planner.store().tasks()[0].id.clone();
    planner.dispatch(Command::ToggleTask(first.clone())).unwrap();

    planner
        .dispatch(Command::OpenEdit {
            kind: ModalKind::Task,
            id: first.clone(),
        })
        .unwrap();
    planner.task_modal.form_mut().unwrap().draft.title = "First, revised".into();
    let outcome = planner.dispatch(Command::Submit(ModalKind::Task)).unwrap();
    assert_eq!(
        outcome,
        Outcome::Saved {
            kind: ModalKind::Task,
            id: first.clone(),
            created: false
        }
    );

    let tasks = planner.store().tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, first);
    assert_eq!(tasks[0].title, "First, revised");
    assert!(tasks[0].completed);
}

#[test]
fn filters_select_high_pending_tasks() {
    let mut planner = planner();
    let specs = [
        ("a", Priority::High, false),
        ("b", Priority::High, true),
        ("c", Priority::Low, false),
        ("d", Priority::High, false),
    ];
    for (title, priority, completed) in specs {
        planner.dispatch(Command::OpenCreate(ModalKind::Task)).unwrap();
        let form = planner.task_modal.form_mut().unwrap();
        form.draft.title = title.into();
        form.draft.priority = Some(priority);
        let Outcome::Saved { id, .. } = planner.dispatch(Command::Submit(ModalKind::Task)).unwrap() else {
            panic!("expected a save");
        };
        if completed {
            planner.dispatch(Command::ToggleTask(id)).unwrap();
        }
    }

    planner
        .dispatch(Command::SetPriorityFilter(PriorityFilter::Only(Priority::High)))
        .unwrap();
    planner
        .dispatch(Command::SetStatusFilter(StatusFilter::Pending))
        .unwrap();
    let titles: Vec<&str> = planner.visible_tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "d"]);
}

#[test]
fn delete_needs_confirmation() {
    let mut planner = planner();
    planner.dispatch(Command::OpenCreate(ModalKind::Sticky)).unwrap();
    planner.sticky_modal.form_mut().unwrap().draft.content = "Call the library".into();
    planner.dispatch(Command::Submit(ModalKind::Sticky)).unwrap();
    let id = planner.store().sticky_notes()[0].id.clone();

    planner
        .dispatch(Command::RequestDelete {
            kind: ModalKind::Sticky,
            id: id.clone(),
        })
        .unwrap();
    assert_eq!(planner.store().sticky_notes().len(), 1);
    assert_eq!(planner.pending_delete().unwrap().label, "Call the library");

    planner.dispatch(Command::CancelDelete).unwrap();
    assert!(matches!(
        planner.dispatch(Command::ConfirmDelete),
        Err(PlannerError::NoPendingDelete)
    ));

    planner
        .dispatch(Command::RequestDelete {
            kind: ModalKind::Sticky,
            id: id.clone(),
        })
        .unwrap();
    planner.dispatch(Command::ConfirmDelete).unwrap();
    assert!(planner.store().sticky_notes().is_empty());
}

/// Backend whose writes always fail
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::DirectoryError("read-only".into()))
    }

    fn delete(&mut self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::DirectoryError("read-only".into()))
    }
}

#[test]
fn failed_write_through_keeps_memory_state() {
    let mut planner = planner_with(EntityStore::load(StorageGateway::new(Box::new(ReadOnlyStore))));
    planner.dispatch(Command::OpenCreate(ModalKind::Task)).unwrap();
    planner.task_modal.form_mut().unwrap().draft.title = "Unsaved".into();

    let result = planner.dispatch(Command::Submit(ModalKind::Task));
    assert!(matches!(result, Err(PlannerError::Store(_))));
    assert_eq!(planner.store().tasks().len(), 1);
    assert!(!planner.task_modal.is_open());
    assert_eq!(planner.store().find_by_id::<Task>(&planner.store().tasks()[0].id).unwrap().title, "Unsaved");
}
