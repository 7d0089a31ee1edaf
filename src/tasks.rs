use chrono::{Duration, NaiveDate};
use std::fmt;

use crate::models::{Priority, Task};
use crate::utils::parse_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => task.priority == *priority,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(PriorityFilter::All),
            other => Priority::parse(other).map(PriorityFilter::Only),
        }
    }

    /// all -> high -> medium -> low -> all
    pub fn next(&self) -> Self {
        match self {
            PriorityFilter::All => PriorityFilter::Only(Priority::High),
            PriorityFilter::Only(Priority::High) => PriorityFilter::Only(Priority::Medium),
            PriorityFilter::Only(Priority::Medium) => PriorityFilter::Only(Priority::Low),
            PriorityFilter::Only(Priority::Low) => PriorityFilter::All,
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityFilter::All => f.write_str("all"),
            PriorityFilter::Only(priority) => write!(f, "{}", priority),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(StatusFilter::All),
            "completed" => Some(StatusFilter::Completed),
            "pending" => Some(StatusFilter::Pending),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Pending => "pending",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
    Title,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "due" | "duedate" | "due-date" | "date" => Some(SortKey::DueDate),
            "priority" => Some(SortKey::Priority),
            "title" => Some(SortKey::Title),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortKey::DueDate => SortKey::Priority,
            SortKey::Priority => SortKey::Title,
            SortKey::Title => SortKey::DueDate,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::DueDate => "due date",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
        })
    }
}

/// Filter and sort settings for the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskQuery {
    pub priority: PriorityFilter,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl TaskQuery {
    pub fn is_filtered(&self) -> bool {
        self.priority != PriorityFilter::All || self.status != StatusFilter::All
    }

    /// Filter then stable-sort `tasks`
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut selected: Vec<&Task> = tasks
            .iter()
            .filter(|task| self.priority.matches(task))
            .filter(|task| self.status.matches(task))
            .collect();

        match self.sort {
            SortKey::Priority => selected.sort_by_key(|task| task.priority),
            SortKey::Title => selected.sort_by(|a, b| a.title.cmp(&b.title)),
            SortKey::DueDate => selected.sort_by_key(|task| due_sort_key(task)),
        }
        selected
    }

    pub fn summary(&self) -> String {
        format!(
            "Priority: {} | Status: {} | Sort: {}",
            self.priority, self.status, self.sort
        )
    }

    /// Message shown when the filtered list is empty
    pub fn empty_hint(&self) -> &'static str {
        if self.is_filtered() {
            "No tasks found. Try adjusting your filters"
        } else {
            "No tasks found. Add a new task to get started!"
        }
    }
}

/// Missing or unparsable due dates sort as the epoch, i.e. first
fn due_sort_key(task: &Task) -> NaiveDate {
    task.due_date
        .as_deref()
        .and_then(|d| parse_date(d).ok())
        // NaiveDate::default() is 1970-01-01
        .unwrap_or_default()
}

/// Per-priority counts over the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn compute(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            match task.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
            counts
        })
    }
}

/// Completion percentage, `0` for an empty collection
pub fn progress(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|task| task.completed).count();
    let percent = (completed as f64 / tasks.len() as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Aggregates shown next to the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub counts: PriorityCounts,
    pub progress: u8,
    pub total: usize,
    pub completed: usize,
}

impl TaskStats {
    pub fn compute(tasks: &[Task]) -> Self {
        Self {
            counts: PriorityCounts::compute(tasks),
            progress: progress(tasks),
            total: tasks.len(),
            completed: tasks.iter().filter(|task| task.completed).count(),
        }
    }
}

/// "Today", "Tomorrow", "Mon, Jun 10" or "No date"
pub fn due_label(due_date: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = due_date.filter(|d| !d.trim().is_empty()) else {
        return "No date".to_string();
    };
    match parse_date(raw) {
        Ok(date) if date == today => "Today".to_string(),
        Ok(date) if date == today + Duration::days(1) => "Tomorrow".to_string(),
        Ok(date) => date.format("%a, %b %-d").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task(id: &str, priority: Priority, completed: bool, due: Option<&str>) -> Task {
        let mut task = Task::new(id.to_string(), format!("Task {id}"), priority);
        task.completed = completed;
        task.due_date = due.map(str::to_string);
        task
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn high_pending_filter() {
        let tasks = vec![
            task("1", Priority::High, false, None),
            task("2", Priority::High, true, None),
            task("3", Priority::Low, false, None),
            task("4", Priority::High, false, None),
        ];
        let query = TaskQuery {
            priority: PriorityFilter::Only(Priority::High),
            status: StatusFilter::Pending,
            sort: SortKey::Priority,
        };
        assert_eq!(ids(&query.apply(&tasks)), vec!["1", "4"]);
    }

    #[test]
    fn priority_sort_is_stable() {
        let tasks = vec![
            task("a", Priority::Low, false, None),
            task("b", Priority::High, false, None),
            task("c", Priority::Low, false, None),
            task("d", Priority::Medium, false, None),
            task("e", Priority::High, false, None),
        ];
        let query = TaskQuery {
            sort: SortKey::Priority,
            ..TaskQuery::default()
        };
        assert_eq!(ids(&query.apply(&tasks)), vec!["b", "e", "d", "a", "c"]);
    }

    #[test]
    fn due_date_sort_puts_missing_first() {
        let tasks = vec![
            task("late", Priority::Low, false, Some("2024-07-01")),
            task("none", Priority::Low, false, None),
            task("early", Priority::Low, false, Some("2024-06-01")),
        ];
        assert_eq!(
            ids(&TaskQuery::default().apply(&tasks)),
            vec!["none", "early", "late"]
        );
    }

    #[test]
    fn title_sort_is_case_respecting() {
        let mut lower = task("1", Priority::Low, false, None);
        lower.title = "apple".to_string();
        let mut upper = task("2", Priority::Low, false, None);
        upper.title = "Banana".to_string();
        let tasks = vec![lower, upper];
        let query = TaskQuery {
            sort: SortKey::Title,
            ..TaskQuery::default()
        };
        assert_eq!(ids(&query.apply(&tasks)), vec!["2", "1"]);
    }

    #[test]
    fn progress_rounds_and_handles_empty() {
        let tasks = vec![
            task("1", Priority::High, true, None),
            task("2", Priority::High, false, None),
            task("3", Priority::Low, false, None),
            task("4", Priority::Medium, false, None),
        ];
        assert_eq!(progress(&tasks), 25);
        assert_eq!(progress(&[]), 0);
        assert_eq!(progress(&tasks[..3]), 33);
    }

    #[test]
    fn counts_ignore_filters() {
        let tasks = vec![
            task("1", Priority::High, true, None),
            task("2", Priority::High, false, None),
            task("3", Priority::Low, false, None),
        ];
        let stats = TaskStats::compute(&tasks);
        assert_eq!(
            stats.counts,
            PriorityCounts {
                high: 2,
                medium: 0,
                low: 1
            }
        );
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn due_labels() {
        let today = parse_date("2024-06-10").unwrap();
        assert_eq!(due_label(None, today), "No date");
        assert_eq!(due_label(Some("2024-06-10"), today), "Today");
        assert_eq!(due_label(Some("2024-06-11"), today), "Tomorrow");
        assert_eq!(due_label(Some("2024-06-14"), today), "Fri, Jun 14");
    }

    #[test]
    fn filters_cycle_and_parse() {
        assert_eq!(PriorityFilter::parse("HIGH"), Some(PriorityFilter::Only(Priority::High)));
        assert_eq!(PriorityFilter::Only(Priority::Low).next(), PriorityFilter::All);
        assert_eq!(StatusFilter::parse("pending"), Some(StatusFilter::Pending));
        assert_eq!(SortKey::Title.next(), SortKey::DueDate);
    }
}
