use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used for `created_at` (same shape as a JS `toISOString()`)
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Class,
    Assignment,
    Exam,
    Study,
    #[default]
    Personal,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Class,
        EventType::Assignment,
        EventType::Exam,
        EventType::Study,
        EventType::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Class => "class",
            EventType::Assignment => "assignment",
            EventType::Exam => "exam",
            EventType::Study => "study",
            EventType::Personal => "personal",
        }
    }

    /// Title pre-filled when an event is created from a type preset
    pub fn default_title(&self) -> Option<&'static str> {
        match self {
            EventType::Class => Some("New Class"),
            EventType::Assignment => Some("New Assignment"),
            EventType::Exam => Some("New Exam"),
            EventType::Study => Some("Study Session"),
            EventType::Personal => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Declaration order is the sort order: high < medium < low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High Priority",
            Priority::Medium => "Medium Priority",
            Priority::Low => "Low Priority",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour names offered by the forms. Stored records may carry any string.
pub const COLORS: &[&str] = &["lavender", "pink", "blue", "green", "yellow", "purple"];

pub const DEFAULT_COLOR: &str = "lavender";

/// Recurrence labels offered by the event form (stored, never expanded)
pub const RECURRENCES: &[&str] = &["none", "daily", "weekly", "monthly"];

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: String, // YYYY-MM-DD, zero-padded
    pub start_hour: u8,
    pub end_hour: u8,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<String>,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub created_at: String,
}

impl Event {
    pub fn new(id: String, title: String, date: String, start_hour: u8, end_hour: u8) -> Self {
        Self {
            id,
            title,
            date,
            start_hour,
            end_hour,
            color: default_color(),
            description: None,
            recurring: None,
            event_type: EventType::default(),
            created_at: now_timestamp(),
        }
    }

    pub fn duration(&self) -> u8 {
        self.end_hour.saturating_sub(self.start_hour)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>, // YYYY-MM-DD
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: String,
}

impl Task {
    pub fn new(id: String, title: String, priority: Priority) -> Self {
        Self {
            id,
            title,
            description: None,
            course: None,
            due_date: None,
            priority,
            completed: false,
            created_at: now_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub page_count: u32,
}

impl Notebook {
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            subject: None,
            color: default_color(),
            description: None,
            created_at: now_timestamp(),
            page_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub created_at: String,
}

impl StickyNote {
    pub fn new(id: String, content: String) -> Self {
        Self {
            id,
            title: None,
            content,
            color: default_color(),
            created_at: now_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_reads_browser_layout_with_missing_optionals() {
        let json = r#"{"id":"1718000000000","title":"Lecture","date":"2024-06-10","startHour":9,"endHour":11,"color":"blue"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.start_hour, 9);
        assert_eq!(event.end_hour, 11);
        assert_eq!(event.event_type, EventType::Personal);
        assert_eq!(event.description, None);
        assert_eq!(event.duration(), 2);
    }

    #[test]
    fn task_serializes_camel_case() {
        let mut task = Task::new("42".to_string(), "Essay".to_string(), Priority::High);
        task.due_date = Some("2024-06-12".to_string());
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"dueDate\":\"2024-06-12\""));
        assert!(json.contains("\"priority\":\"high\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn priority_orders_high_first() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Medium];
        priorities.sort();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn notebook_page_count_defaults_to_zero() {
        let json = r#"{"id":"7","title":"Physics","color":"green","createdAt":"2024-06-10T08:00:00.000Z"}"#;
        let notebook: Notebook = serde_json::from_str(json).unwrap();
        assert_eq!(notebook.page_count, 0);
        assert_eq!(notebook.subject, None);
    }
}
