use lavender::storage::{EVENTS_KEY, TASKS_KEY};
use lavender::{EntityStore, Event, Notebook, Priority, SqliteStore, StorageGateway, Task};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn open(dir: &TempDir) -> EntityStore {
    let path = dir.path().join("nested").join("planner.db");
    let backend = SqliteStore::new(path.to_str().unwrap()).unwrap();
    EntityStore::load(StorageGateway::new(Box::new(backend)))
}

#[test]
fn records_survive_reopening_the_file() {
    let dir = TempDir::new().unwrap();
    let mut event = Event::new("1".into(), "Lecture".into(), "2024-06-12".into(), 9, 11);
    event.description = Some("Room 204".into());
    let task = Task::new("2".into(), "Problem set".into(), Priority::High);

    {
        let mut store = open(&dir);
        store.upsert(event.clone()).unwrap();
        store.upsert(task.clone()).unwrap();
        store.upsert(Notebook::new("3".into(), "Chemistry".into())).unwrap();
        store.upsert(Notebook::new("4".into(), "History".into())).unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.find_by_id::<Event>("1"), Some(&event));
    assert_eq!(store.tasks(), &[task]);
    // newest first
    let titles: Vec<&str> = store.notebooks().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["History", "Chemistry"]);
}

#[test]
fn remove_is_idempotent_and_durable() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open(&dir);
        store
            .upsert(Event::new("1".into(), "A".into(), "2024-06-12".into(), 9, 10))
            .unwrap();
        store
            .upsert(Event::new("2".into(), "B".into(), "2024-06-13".into(), 9, 10))
            .unwrap();
        store.remove::<Event>("1").unwrap();
        store.remove::<Event>("1").unwrap();
        store.remove::<Event>("missing").unwrap();
        assert_eq!(store.events().len(), 1);
    }
    let store = open(&dir);
    assert_eq!(store.events().len(), 1);
    assert_eq!(store.events()[0].id, "2");
}

#[test]
fn save_of_load_keeps_stored_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("planner.db");
    let mut gateway = StorageGateway::new(Box::new(SqliteStore::new(path.to_str().unwrap()).unwrap()));

    let tasks = vec![
        Task::new("1".into(), "Read".into(), Priority::Low),
        Task::new("2".into(), "Write".into(), Priority::Medium),
    ];
    gateway.save(TASKS_KEY, &tasks).unwrap();
    let before = gateway.raw(TASKS_KEY).unwrap();

    let loaded: Vec<Task> = gateway.load(TASKS_KEY);
    gateway.save(TASKS_KEY, &loaded).unwrap();
    assert_eq!(gateway.raw(TASKS_KEY).unwrap(), before);
}

#[test]
fn records_use_camel_case_and_default_missing_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("planner.db");
    let mut gateway = StorageGateway::new(Box::new(SqliteStore::new(path.to_str().unwrap()).unwrap()));

    gateway
        .save(EVENTS_KEY, &[Event::new("1".into(), "Lab".into(), "2024-06-12".into(), 13, 15)])
        .unwrap();
    let raw = gateway.raw(EVENTS_KEY).unwrap().unwrap();
    assert!(raw.contains("\"startHour\":13"));
    assert!(raw.contains("\"eventType\":\"personal\""));

    // Older data without optional fields still loads
    let mut sparse = SqliteStore::new(path.to_str().unwrap()).unwrap();
    lavender::KeyValueStore::set(
        &mut sparse,
        EVENTS_KEY,
        r#"[{"id":"9","title":"Old","date":"2024-06-10","startHour":8,"endHour":9}]"#,
    )
    .unwrap();
    let events: Vec<Event> = StorageGateway::new(Box::new(sparse)).load(EVENTS_KEY);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].color, "lavender");
    assert_eq!(events[0].description, None);
}
