pub mod calendar;
pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;
pub mod models;
pub mod notes;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use controller::{Command, ModalKind, Outcome, Planner, PlannerError};
pub use models::{Event, EventType, Notebook, Priority, StickyNote, Task};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageGateway};
pub use store::EntityStore;
pub use utils::Profile;
