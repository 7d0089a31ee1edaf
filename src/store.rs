use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{Event, Notebook, StickyNote, Task};
use crate::storage::{
    EVENTS_KEY, NOTEBOOKS_KEY, STICKY_NOTES_KEY, StorageError, StorageGateway, TASKS_KEY,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Write-through failed for '{key}': {source}")]
    WriteThrough {
        key: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
}

/// Where a record that is new (or edited) lands in its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended when new, replaced in place when edited
    Append,
    /// Prepended when new, moved to the front when edited
    Prepend,
}

/// In-memory copy of every collection
#[derive(Debug, Default, Clone)]
pub struct Collections {
    pub events: Vec<Event>,
    pub tasks: Vec<Task>,
    pub notebooks: Vec<Notebook>,
    pub sticky_notes: Vec<StickyNote>,
}

/// A record kind owned by the [`EntityStore`]
pub trait Record: Serialize + DeserializeOwned + Clone {
    const STORAGE_KEY: &'static str;
    const PLACEMENT: Placement;
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn collection(collections: &Collections) -> &Vec<Self>;
    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self>;
}

impl Record for Event {
    const STORAGE_KEY: &'static str = EVENTS_KEY;
    const PLACEMENT: Placement = Placement::Append;
    const KIND: &'static str = "event";

    fn id(&self) -> &str {
        &self.id
    }
    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.events
    }
    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.events
    }
}

impl Record for Task {
    const STORAGE_KEY: &'static str = TASKS_KEY;
    const PLACEMENT: Placement = Placement::Append;
    const KIND: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.tasks
    }
    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.tasks
    }
}

impl Record for Notebook {
    const STORAGE_KEY: &'static str = NOTEBOOKS_KEY;
    const PLACEMENT: Placement = Placement::Prepend;
    const KIND: &'static str = "notebook";

    fn id(&self) -> &str {
        &self.id
    }
    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.notebooks
    }
    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.notebooks
    }
}

impl Record for StickyNote {
    const STORAGE_KEY: &'static str = STICKY_NOTES_KEY;
    const PLACEMENT: Placement = Placement::Prepend;
    const KIND: &'static str = "sticky note";

    fn id(&self) -> &str {
        &self.id
    }
    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.sticky_notes
    }
    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.sticky_notes
    }
}

/// Sole owner of the planner collections.
///
/// Every mutation updates memory first and then writes the whole collection
/// through the gateway before returning. A failed write is reported but the
/// in-memory change is kept; the next successful write of that collection
/// brings storage back in line.
pub struct EntityStore {
    gateway: StorageGateway,
    collections: Collections,
}

impl EntityStore {
    /// Load every collection from storage
    pub fn load(gateway: StorageGateway) -> Self {
        let collections = Collections {
            events: gateway.load(EVENTS_KEY),
            tasks: gateway.load(TASKS_KEY),
            notebooks: gateway.load(NOTEBOOKS_KEY),
            sticky_notes: gateway.load(STICKY_NOTES_KEY),
        };
        tracing::debug!(
            events = collections.events.len(),
            tasks = collections.tasks.len(),
            notebooks = collections.notebooks.len(),
            sticky_notes = collections.sticky_notes.len(),
            "loaded planner collections"
        );
        Self {
            gateway,
            collections,
        }
    }

    pub fn all<T: Record>(&self) -> &[T] {
        T::collection(&self.collections)
    }

    pub fn find_by_id<T: Record>(&self, id: &str) -> Option<&T> {
        T::collection(&self.collections)
            .iter()
            .find(|record| record.id() == id)
    }

    pub fn events(&self) -> &[Event] {
        &self.collections.events
    }

    pub fn tasks(&self) -> &[Task] {
        &self.collections.tasks
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.collections.notebooks
    }

    pub fn sticky_notes(&self) -> &[StickyNote] {
        &self.collections.sticky_notes
    }

    /// Insert or replace a record by id, then write through
    pub fn upsert<T: Record>(&mut self, record: T) -> Result<(), StoreError> {
        let items = T::collection_mut(&mut self.collections);
        let existing = items.iter().position(|item| item.id() == record.id());

        match (existing, T::PLACEMENT) {
            (Some(index), Placement::Append) => items[index] = record,
            (Some(index), Placement::Prepend) => {
                items.remove(index);
                items.insert(0, record);
            }
            (None, Placement::Append) => items.push(record),
            (None, Placement::Prepend) => items.insert(0, record),
        }

        tracing::debug!(kind = T::KIND, updated = existing.is_some(), "upserted record");
        self.write_through::<T>()
    }

    /// Drop a record by id, then write through. Unknown ids are a no-op on
    /// the collection (storage is still rewritten with the same content).
    pub fn remove<T: Record>(&mut self, id: &str) -> Result<(), StoreError> {
        let items = T::collection_mut(&mut self.collections);
        let before = items.len();
        items.retain(|item| item.id() != id);

        tracing::debug!(kind = T::KIND, id, removed = before != items.len(), "removed record");
        self.write_through::<T>()
    }

    /// Flip a task's completion flag
    pub fn toggle_task(&mut self, id: &str) -> Result<bool, StoreError> {
        let task = self
            .collections
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| StoreError::NotFound {
                kind: Task::KIND,
                id: id.to_string(),
            })?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.write_through::<Task>()?;
        Ok(completed)
    }

    /// Fresh timestamp-derived id, unique within `T`'s collection
    pub fn mint_id<T: Record>(&self) -> String {
        let mut candidate = chrono::Utc::now().timestamp_millis();
        let items = T::collection(&self.collections);
        while items.iter().any(|item| item.id() == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn write_through<T: Record>(&mut self) -> Result<(), StoreError> {
        let items = T::collection(&self.collections);
        self.gateway
            .save(T::STORAGE_KEY, items)
            .map_err(|source| {
                tracing::error!(key = T::STORAGE_KEY, error = %source, "write-through failed");
                StoreError::WriteThrough {
                    key: T::STORAGE_KEY,
                    source,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::storage::{KeyValueStore, MemoryStore};
    use pretty_assertions::assert_eq;

    fn empty_store() -> EntityStore {
        EntityStore::load(StorageGateway::new(Box::new(MemoryStore::new())))
    }

    fn event(id: &str, date: &str) -> Event {
        Event::new(id.to_string(), format!("Event {id}"), date.to_string(), 9, 11)
    }

    fn notebook(id: &str) -> Notebook {
        Notebook::new(id.to_string(), format!("Notebook {id}"))
    }

    #[test]
    fn upsert_then_find_returns_record_unchanged() {
        let mut store = empty_store();
        let e = event("1", "2024-06-10");
        store.upsert(e.clone()).unwrap();
        assert_eq!(store.find_by_id::<Event>("1"), Some(&e));
        assert_eq!(store.all::<Event>(), store.events());
    }

    #[test]
    fn events_append_and_replace_in_place() {
        let mut store = empty_store();
        store.upsert(event("1", "2024-06-10")).unwrap();
        store.upsert(event("2", "2024-06-11")).unwrap();
        store.upsert(event("3", "2024-06-12")).unwrap();

        let mut edited = event("2", "2024-06-14");
        edited.title = "Moved".to_string();
        store.upsert(edited).unwrap();

        let ids: Vec<&str> = store.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(store.events()[1].title, "Moved");
    }

    #[test]
    fn notebooks_prepend_and_move_to_front_on_edit() {
        let mut store = empty_store();
        store.upsert(notebook("a")).unwrap();
        store.upsert(notebook("b")).unwrap();
        store.upsert(notebook("c")).unwrap();
        let ids: Vec<&str> = store.notebooks().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        store.upsert(notebook("a")).unwrap();
        let ids: Vec<&str> = store.notebooks().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn remove_unknown_id_is_idempotent() {
        let mut store = empty_store();
        store.upsert(event("1", "2024-06-10")).unwrap();
        store.remove::<Event>("missing").unwrap();
        store.remove::<Event>("1").unwrap();
        store.remove::<Event>("1").unwrap();
        assert!(store.events().is_empty());
    }

    #[test]
    fn mutations_write_through_to_storage() {
        let mut store = empty_store();
        store
            .upsert(Task::new("t1".to_string(), "Essay".to_string(), Priority::High))
            .unwrap();
        let raw = store.gateway.raw(TASKS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"Essay\""));

        store.remove::<Task>("t1").unwrap();
        assert_eq!(store.gateway.raw(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn toggle_task_flips_and_reports_missing() {
        let mut store = empty_store();
        store
            .upsert(Task::new("t1".to_string(), "Essay".to_string(), Priority::Low))
            .unwrap();
        assert!(store.toggle_task("t1").unwrap());
        assert!(!store.toggle_task("t1").unwrap());
        assert!(matches!(
            store.toggle_task("nope"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn mint_id_skips_taken_ids() {
        let mut store = empty_store();
        let first = store.mint_id::<Event>();
        store.upsert(event(&first, "2024-06-10")).unwrap();
        let second = store.mint_id::<Event>();
        assert_ne!(first, second);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::DirectoryError("read-only".to_string()))
        }
        fn delete(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let mut store = EntityStore::load(StorageGateway::new(Box::new(FailingStore)));
        let result = store.upsert(event("1", "2024-06-10"));
        assert!(matches!(result, Err(StoreError::WriteThrough { .. })));
        assert_eq!(store.events().len(), 1);
    }
}
