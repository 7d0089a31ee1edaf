use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Storage key for the calendar events collection
pub const EVENTS_KEY: &str = "calendarEvents";
pub const TASKS_KEY: &str = "tasks";
pub const NOTEBOOKS_KEY: &str = "notebooks";
pub const STICKY_NOTES_KEY: &str = "stickyNotes";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create storage directory: {0}")]
    DirectoryError(String),
    #[error("Failed to serialize collection: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Synchronous string key-value store backing the planner collections
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Key-value table in a SQLite file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the storage file and initialize the schema
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let store = SqliteStore { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let store = SqliteStore {
            conn: Connection::open_in_memory()?,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let result = self.conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![
                key,
                value,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }
}

/// In-process store, used in tests and as a scratch backend
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed JSON view over a [`KeyValueStore`].
///
/// Reads never fail: a missing key, a backend error, or text that does not
/// parse as a JSON array of `T` all load as an empty collection.
pub struct StorageGateway {
    backend: Box<dyn KeyValueStore>,
}

impl StorageGateway {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let text = match self.backend.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using empty collection");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&text) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored collection is not valid JSON, using empty collection");
                Vec::new()
            }
        }
    }

    pub fn save<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<(), StorageError> {
        let text = serde_json::to_string(items)?;
        self.backend.set(key, &text)
    }

    pub fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key)
    }

    /// Raw stored text for a key
    pub fn raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Task};

    fn gateway() -> StorageGateway {
        StorageGateway::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn missing_key_loads_empty() {
        let gateway = gateway();
        let tasks: Vec<Task> = gateway.load(TASKS_KEY);
        assert!(tasks.is_empty());
    }

    #[test]
    fn malformed_text_loads_empty() {
        let mut backend = MemoryStore::new();
        backend.set(TASKS_KEY, "{not json").unwrap();
        let gateway = StorageGateway::new(Box::new(backend));
        let tasks: Vec<Task> = gateway.load(TASKS_KEY);
        assert!(tasks.is_empty());
    }

    #[test]
    fn save_of_load_is_a_no_op() {
        let mut gateway = gateway();
        let tasks = vec![
            Task::new("1".to_string(), "Read".to_string(), Priority::Low),
            Task::new("2".to_string(), "Write".to_string(), Priority::High),
        ];
        gateway.save(TASKS_KEY, &tasks).unwrap();
        let before = gateway.raw(TASKS_KEY).unwrap();

        let loaded: Vec<Task> = gateway.load(TASKS_KEY);
        gateway.save(TASKS_KEY, &loaded).unwrap();

        assert_eq!(gateway.raw(TASKS_KEY).unwrap(), before);
    }

    #[test]
    fn sqlite_store_overwrites_and_deletes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "[1]").unwrap();
        store.set("k", "[2]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[2]"));

        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
