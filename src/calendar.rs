//! Weekly calendar projection.
//!
//! The grid shows a Monday-to-Sunday week with one row per hour. Rows start
//! at 05:00 and run through 04:00 of the next morning; every row of a day
//! column carries that column's date, so a 02:00 event dated Tuesday sits at
//! the bottom of the Tuesday column.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use thiserror::Error;

use crate::models::Event;
use crate::utils::{format_date, parse_date};

/// Wall-clock hour shown in the first grid row
pub const DAY_START_HOUR: u8 = 5;
pub const SLOTS_PER_DAY: usize = 24;
pub const DAYS_PER_WEEK: usize = 7;

/// Monday on or before `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    // 0 = Sunday .. 6 = Saturday
    let day = date.weekday().num_days_from_sunday() as i64;
    let back = if day == 0 { 6 } else { day - 1 };
    date - Duration::days(back)
}

pub fn end_of_week(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

/// Wall-clock hour for a grid row
pub fn slot_hour(slot: usize) -> u8 {
    ((slot + DAY_START_HOUR as usize) % 24) as u8
}

/// Grid row for a wall-clock hour
pub fn slot_for_hour(hour: u8) -> usize {
    (hour as usize + 24 - DAY_START_HOUR as usize) % 24
}

/// Hours of the grid rows, top to bottom
pub fn slot_hours() -> Vec<u8> {
    (0..SLOTS_PER_DAY).map(slot_hour).collect()
}

/// `9` -> `"9:00 AM"`, `0` and `24` -> `"12:00 AM"`, `12` -> `"12:00 PM"`
pub fn format_hour(hour: u8) -> String {
    let hour = hour % 24;
    let h = if hour % 12 == 0 { 12 } else { hour % 12 };
    let ampm = if hour < 12 { "AM" } else { "PM" };
    format!("{}:00 {}", h, ampm)
}

/// `"June 10 - June 16, 2024"`
pub fn week_range_label(week_start: NaiveDate) -> String {
    let week_end = end_of_week(week_start);
    format!(
        "{} - {}, {}",
        week_start.format("%B %-d"),
        week_end.format("%B %-d"),
        week_start.year()
    )
}

/// Events dated inside the week starting at `week_start`, in collection order
pub fn events_for_week(events: &[Event], week_start: NaiveDate) -> Vec<&Event> {
    let start = format_date(week_start);
    let end = format_date(end_of_week(week_start));
    events
        .iter()
        .filter(|event| event.date.as_str() >= start.as_str() && event.date.as_str() <= end.as_str())
        .collect()
}

/// Day-proximity annotation, recomputed on every render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueClass {
    Today,
    OneDay,
    TwoDays,
    ThreeDays,
}

impl DueClass {
    pub fn css_name(&self) -> &'static str {
        match self {
            DueClass::Today => "due-today",
            DueClass::OneDay => "due-1-day",
            DueClass::TwoDays => "due-2-days",
            DueClass::ThreeDays => "due-3-days",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            DueClass::Today => 0,
            DueClass::OneDay => 1,
            DueClass::TwoDays => 2,
            DueClass::ThreeDays => 3,
        }
    }
}

pub fn due_class(event_date: NaiveDate, today: NaiveDate) -> Option<DueClass> {
    match (event_date - today).num_days() {
        0 => Some(DueClass::Today),
        1 => Some(DueClass::OneDay),
        2 => Some(DueClass::TwoDays),
        3 => Some(DueClass::ThreeDays),
        _ => None,
    }
}

/// Hour-granular status relative to the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Starts within the next 24 hours
    DueSoon,
    /// Between start and end
    InProgress,
}

pub fn event_status(event: &Event, now: NaiveDateTime) -> Option<EventStatus> {
    let date = parse_date(&event.date).ok()?;
    let start = date.and_hms_opt(0, 0, 0)? + Duration::hours(event.start_hour as i64);
    let end = date.and_hms_opt(0, 0, 0)? + Duration::hours(event.end_hour as i64);

    if now >= start && now < end {
        Some(EventStatus::InProgress)
    } else if now < start && start - now <= Duration::hours(24) {
        Some(EventStatus::DueSoon)
    } else {
        None
    }
}

/// An event placed in a grid cell with its derived annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedEvent {
    pub event: Event,
    pub due: Option<DueClass>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub cells: Vec<Vec<PlacedEvent>>,
}

impl DayColumn {
    pub fn events_at(&self, slot: usize) -> &[PlacedEvent] {
        self.cells.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Position of "now" inside the displayed week
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMarker {
    pub day_index: usize,
    pub slot: usize,
    /// Minutes past the hour as a fraction of the row height
    pub fraction: f32,
}

pub fn current_time_marker(now: NaiveDateTime, week_start: NaiveDate) -> Option<TimeMarker> {
    let offset = (now.date() - week_start).num_days();
    if !(0..DAYS_PER_WEEK as i64).contains(&offset) {
        return None;
    }
    Some(TimeMarker {
        day_index: offset as usize,
        slot: slot_for_hour(now.hour() as u8),
        fraction: now.minute() as f32 / 60.0,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekGrid {
    pub week_start: NaiveDate,
    pub days: Vec<DayColumn>,
    pub marker: Option<TimeMarker>,
}

impl WeekGrid {
    /// Project `events` onto the week starting at `week_start`.
    ///
    /// This is a pure function of its inputs; the periodic refresh simply
    /// calls it again with a newer `now`.
    pub fn build(events: &[Event], week_start: NaiveDate, now: NaiveDateTime) -> Self {
        let today = now.date();
        let mut days: Vec<DayColumn> = (0..DAYS_PER_WEEK)
            .map(|offset| {
                let date = week_start + Duration::days(offset as i64);
                DayColumn {
                    date,
                    weekday: date.weekday(),
                    cells: vec![Vec::new(); SLOTS_PER_DAY],
                }
            })
            .collect();

        for event in events_for_week(events, week_start) {
            let Ok(date) = parse_date(&event.date) else {
                tracing::warn!(id = %event.id, date = %event.date, "skipping event with unparsable date");
                continue;
            };
            let offset = (date - week_start).num_days();
            let Some(day) = usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) else {
                continue;
            };
            if event.start_hour > 23 {
                continue;
            }
            let slot = slot_for_hour(event.start_hour);
            day.cells[slot].push(PlacedEvent {
                event: event.clone(),
                due: due_class(date, today),
                status: event_status(event, now),
            });
        }

        Self {
            week_start,
            days,
            marker: current_time_marker(now, week_start),
        }
    }

    pub fn range_label(&self) -> String {
        week_range_label(self.week_start)
    }

    /// Date and wall-clock hour of a grid cell
    pub fn cell_target(&self, day_index: usize, slot: usize) -> Option<(NaiveDate, u8)> {
        let day = self.days.get(day_index)?;
        (slot < SLOTS_PER_DAY).then(|| (day.date, slot_hour(slot)))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RescheduleError {
    #[error("Start hour {0} is outside 0-23")]
    InvalidHour(u8),
    #[error("Event would end after midnight ({0}:00)")]
    PastMidnight(u16),
}

/// Move an event to `(date, hour)`, keeping its duration.
/// A stored event whose end is not after its start moves as a one-hour event.
pub fn reschedule(event: &Event, date: NaiveDate, start_hour: u8) -> Result<Event, RescheduleError> {
    if start_hour > 23 {
        return Err(RescheduleError::InvalidHour(start_hour));
    }
    let duration = u16::from(event.duration().max(1));
    let end_hour = u16::from(start_hour) + duration;
    let end_hour = u8::try_from(end_hour)
        .ok()
        .filter(|end| *end <= 24)
        .ok_or(RescheduleError::PastMidnight(end_hour))?;
    let mut moved = event.clone();
    moved.date = format_date(date);
    moved.start_hour = start_hour;
    moved.end_hour = end_hour;
    Ok(moved)
}

/// Percent of the semester elapsed on `today`, clamped to 0..=100
pub fn semester_progress(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> u8 {
    let total = (end - start).num_days();
    if total <= 0 {
        return if today >= end { 100 } else { 0 };
    }
    let passed = (today - start).num_days();
    let percent = (passed as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}
