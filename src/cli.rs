use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use thiserror::Error;

use crate::calendar::{self, WeekGrid, format_hour};
use crate::controller::{Command, ModalKind, Outcome, Planner, PlannerError};
use crate::models::{EventType, Priority};
use crate::tasks::{self, PriorityFilter, SortKey, StatusFilter, TaskQuery, TaskStats};
use crate::utils::parse_date;

#[derive(Parser)]
#[command(name = "lavender")]
#[command(about = "Lavender - a weekly calendar, task list and notes board for the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/storage)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a calendar event
    AddEvent {
        /// Event title
        title: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Start hour (0-23)
        #[arg(long, default_value_t = 9)]
        start: u8,
        /// End hour (1-24), defaults to one hour after start
        #[arg(long)]
        end: Option<u8>,
        /// class, assignment, exam, study or personal
        #[arg(long = "type")]
        event_type: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a task
    AddTask {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        due: Option<String>,
        /// high, medium or low
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a notebook
    AddNotebook {
        /// Notebook title
        title: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a sticky note
    AddSticky {
        /// Note content
        content: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Print the week containing a date
    Week {
        /// Any date in the week (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the task list
    Tasks {
        /// all, high, medium or low
        #[arg(long)]
        priority: Option<String>,
        /// all, completed or pending
        #[arg(long)]
        status: Option<String>,
        /// due, priority or title
        #[arg(long)]
        sort: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    PlannerError(#[from] PlannerError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("The {0} was not saved")]
    NotSaved(ModalKind),
    #[error("Invalid value for --{flag}: '{value}'")]
    InvalidArgument { flag: &'static str, value: String },
}

fn invalid(flag: &'static str, value: &str) -> CliError {
    CliError::InvalidArgument {
        flag,
        value: value.to_string(),
    }
}

/// Submit the open form and return the saved id
fn submit(planner: &mut Planner, kind: ModalKind) -> Result<String, CliError> {
    match planner.dispatch(Command::Submit(kind))? {
        Outcome::Saved { id, .. } => Ok(id),
        _ => Err(CliError::NotSaved(kind)),
    }
}

/// Handle the add-event command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_event(
    planner: &mut Planner,
    title: String,
    date: Option<String>,
    start: u8,
    end: Option<u8>,
    event_type: Option<String>,
    color: Option<String>,
    description: Option<String>,
) -> Result<String, CliError> {
    let event_type = match event_type {
        Some(raw) => EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == raw.trim().to_lowercase())
            .ok_or_else(|| invalid("type", &raw))?,
        None => EventType::default(),
    };

    planner.dispatch(Command::OpenEventPreset(event_type))?;
    if let Some(form) = planner.event_modal.form_mut() {
        let draft = &mut form.draft;
        draft.title = title;
        if let Some(date) = date {
            draft.date = date;
        }
        draft.set_start_hour(start.to_string());
        if let Some(end) = end {
            draft.end_hour = end.to_string();
        }
        if let Some(color) = color {
            draft.color = color;
        }
        draft.description = description.unwrap_or_default();
    }

    let id = submit(planner, ModalKind::Event)?;
    println!("Event created successfully (ID: {})", id);
    Ok(id)
}

/// Handle the add-task command
pub fn handle_add_task(
    planner: &mut Planner,
    title: String,
    due: Option<String>,
    priority: String,
    course: Option<String>,
    description: Option<String>,
) -> Result<String, CliError> {
    let priority = Priority::parse(&priority).ok_or_else(|| invalid("priority", &priority))?;
    if let Some(due_str) = &due {
        parse_date(due_str).map_err(|e| {
            CliError::DateParseError(format!("Invalid date format '{}': {}", due_str, e))
        })?;
    }

    planner.dispatch(Command::OpenCreate(ModalKind::Task))?;
    if let Some(form) = planner.task_modal.form_mut() {
        let draft = &mut form.draft;
        draft.title = title;
        if let Some(due) = due {
            draft.due_date = due;
        }
        draft.priority = Some(priority);
        draft.course = course.unwrap_or_default();
        draft.description = description.unwrap_or_default();
    }

    let id = submit(planner, ModalKind::Task)?;
    println!("Task created successfully (ID: {})", id);
    Ok(id)
}

/// Handle the add-notebook command
pub fn handle_add_notebook(
    planner: &mut Planner,
    title: String,
    subject: Option<String>,
    color: Option<String>,
    description: Option<String>,
) -> Result<String, CliError> {
    planner.dispatch(Command::OpenCreate(ModalKind::Notebook))?;
    if let Some(form) = planner.notebook_modal.form_mut() {
        let draft = &mut form.draft;
        draft.title = title;
        draft.subject = subject.unwrap_or_default();
        if let Some(color) = color {
            draft.color = color;
        }
        draft.description = description.unwrap_or_default();
    }

    let id = submit(planner, ModalKind::Notebook)?;
    println!("Notebook created successfully (ID: {})", id);
    Ok(id)
}

/// Handle the add-sticky command
pub fn handle_add_sticky(
    planner: &mut Planner,
    content: String,
    title: Option<String>,
    color: Option<String>,
) -> Result<String, CliError> {
    planner.dispatch(Command::OpenCreate(ModalKind::Sticky))?;
    if let Some(form) = planner.sticky_modal.form_mut() {
        let draft = &mut form.draft;
        draft.content = content;
        draft.title = title.unwrap_or_default();
        if let Some(color) = color {
            draft.color = color;
        }
    }

    let id = submit(planner, ModalKind::Sticky)?;
    println!("Sticky note created successfully (ID: {})", id);
    Ok(id)
}

/// Plain-text rendering of a week grid
pub fn format_week(grid: &WeekGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", grid.range_label());
    for day in &grid.days {
        let _ = writeln!(out, "\n{} {}", day.weekday, day.date.format("%b %-d"));
        let mut any = false;
        for slot in 0..calendar::SLOTS_PER_DAY {
            for placed in day.events_at(slot) {
                any = true;
                let due = placed
                    .due
                    .map(|d| format!(" [{}]", d.css_name()))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {} - {}  {} ({}){}",
                    format_hour(placed.event.start_hour),
                    format_hour(placed.event.end_hour % 24),
                    placed.event.title,
                    placed.event.event_type,
                    due
                );
            }
        }
        if !any {
            let _ = writeln!(out, "  -");
        }
    }
    out
}

/// Handle the week command
pub fn handle_week(planner: &mut Planner, date: Option<String>) -> Result<(), CliError> {
    if let Some(date_str) = date {
        let date = parse_date(&date_str).map_err(|e| {
            CliError::DateParseError(format!("Invalid date format '{}': {}", date_str, e))
        })?;
        let target = calendar::start_of_week(date);
        // Walk from the current week to the target one
        planner.dispatch(Command::CurrentWeek)?;
        while planner.week_start() < target {
            planner.dispatch(Command::NextWeek)?;
        }
        while planner.week_start() > target {
            planner.dispatch(Command::PreviousWeek)?;
        }
    }
    print!("{}", format_week(&planner.week_grid()));
    Ok(())
}

/// Plain-text rendering of a filtered task list with its aggregates
pub fn format_tasks(planner: &Planner) -> String {
    let today = planner.today();
    let visible = planner.visible_tasks();
    let stats = TaskStats::compute(planner.store().tasks());
    let mut out = String::new();

    let _ = writeln!(out, "{}", planner.task_query().summary());
    if visible.is_empty() {
        let _ = writeln!(out, "{}", planner.task_query().empty_hint());
    }
    for task in visible {
        let _ = writeln!(
            out,
            "[{}] {:<6} {}  ({})",
            if task.completed { "x" } else { " " },
            task.priority.as_str(),
            task.title,
            tasks::due_label(task.due_date.as_deref(), today)
        );
    }
    let _ = writeln!(
        out,
        "\nHigh: {}  Medium: {}  Low: {}  Progress: {}% ({}/{})",
        stats.counts.high,
        stats.counts.medium,
        stats.counts.low,
        stats.progress,
        stats.completed,
        stats.total
    );
    out
}

/// Handle the tasks command
pub fn handle_tasks(
    planner: &mut Planner,
    priority: Option<String>,
    status: Option<String>,
    sort: Option<String>,
) -> Result<(), CliError> {
    let mut query = TaskQuery::default();
    if let Some(raw) = priority {
        query.priority = PriorityFilter::parse(&raw).ok_or_else(|| invalid("priority", &raw))?;
    }
    if let Some(raw) = status {
        query.status = StatusFilter::parse(&raw).ok_or_else(|| invalid("status", &raw))?;
    }
    if let Some(raw) = sort {
        query.sort = SortKey::parse(&raw).ok_or_else(|| invalid("sort", &raw))?;
    }

    planner.dispatch(Command::SetPriorityFilter(query.priority))?;
    planner.dispatch(Command::SetStatusFilter(query.status))?;
    planner.dispatch(Command::SetSort(query.sort))?;
    print!("{}", format_tasks(planner));
    Ok(())
}
