use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Config;
use crate::calendar::{self, EventStatus, PlacedEvent, SLOTS_PER_DAY, WeekGrid};
use crate::tui::app::GridCursor;
use crate::tui::widgets::color::{due_color, get_contrast_text_color, parse_color, record_color};

const LABEL_WIDTH: usize = 9;
const NOW_COLOR: Color = Color::LightRed;

/// What the calendar tab needs besides the grid itself
pub struct GridView<'a> {
    pub grid: &'a WeekGrid,
    pub cursor: GridCursor,
    pub grabbed: Option<&'a str>,
    pub today: NaiveDate,
    pub semester: Option<u8>,
}

/// First visible row so that `cursor_slot` stays on screen
pub fn scroll_to_cursor(scroll: usize, cursor_slot: usize, rows: usize) -> usize {
    if rows == 0 {
        return 0;
    }
    let max_scroll = SLOTS_PER_DAY.saturating_sub(rows);
    let scroll = if cursor_slot < scroll {
        cursor_slot
    } else if cursor_slot >= scroll + rows {
        cursor_slot + 1 - rows
    } else {
        scroll
    };
    scroll.min(max_scroll)
}

/// Pad or cut `text` to exactly `width` columns
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        text.chars().take(width).collect()
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

/// For each slot of a day column, the colour of an event still running there
fn continuation_colors(cells: &[Vec<PlacedEvent>]) -> Vec<Option<&str>> {
    let mut running = vec![None; cells.len()];
    for (slot, events) in cells.iter().enumerate() {
        for placed in events {
            let span = placed.event.duration() as usize;
            for next in slot + 1..(slot + span).min(cells.len()) {
                running[next].get_or_insert(placed.event.color.as_str());
            }
        }
    }
    running
}

fn cell_text(events: &[PlacedEvent], item: usize, selected: bool) -> (String, Option<&PlacedEvent>) {
    if events.is_empty() {
        return (String::new(), None);
    }
    let index = if selected { item % events.len() } else { 0 };
    let shown = &events[index];
    let mut text = String::new();
    if shown.due.is_some() {
        text.push('●');
    }
    text.push_str(&shown.event.title);
    if events.len() > 1 {
        text = format!("{} +{}", text, events.len() - 1);
    }
    (text, Some(shown))
}

pub fn render_week_grid(f: &mut Frame, area: Rect, view: &GridView, scroll: &mut usize, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);
    let base = Style::default().fg(fg_color).bg(bg_color);

    let mut title = format!(" {} ", view.grid.range_label());
    if let Some(percent) = view.semester {
        title.push_str(&format!("· Semester {}% ", percent));
    }
    let block = Block::default().borders(Borders::ALL).title(title).style(base);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width as usize <= LABEL_WIDTH || inner.height < 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // day headers
            Constraint::Min(1),    // hour rows
            Constraint::Length(1), // selected event detail
        ])
        .split(inner);

    let col_width = (inner.width as usize - LABEL_WIDTH) / view.grid.days.len().max(1);
    let rows = chunks[1].height as usize;
    *scroll = scroll_to_cursor(*scroll, view.cursor.slot, rows);

    // Headers
    let mut header = vec![Span::styled(" ".repeat(LABEL_WIDTH), base)];
    for day in &view.grid.days {
        let label = format!(" {} {}", day.weekday, day.date.format("%-m/%-d"));
        let style = if day.date == view.today {
            Style::default()
                .fg(highlight_fg)
                .bg(highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            base.add_modifier(Modifier::BOLD)
        };
        header.push(Span::styled(fit(&label, col_width), style));
    }
    f.render_widget(Paragraph::new(Line::from(header)).style(base), chunks[0]);

    // Hour rows
    let running: Vec<Vec<Option<&str>>> = view
        .grid
        .days
        .iter()
        .map(|day| continuation_colors(&day.cells))
        .collect();

    let mut lines: Vec<Line> = Vec::with_capacity(rows);
    for slot in (*scroll..SLOTS_PER_DAY).take(rows) {
        let hour_label = fit(&calendar::format_hour(calendar::slot_hour(slot)), LABEL_WIDTH);
        let mut spans = vec![Span::styled(hour_label, base.fg(Color::DarkGray))];

        for (day_index, day) in view.grid.days.iter().enumerate() {
            let selected = view.cursor.day == day_index && view.cursor.slot == slot;
            let is_now = view
                .grid
                .marker
                .is_some_and(|m| m.day_index == day_index && m.slot == slot);
            let events = day.events_at(slot);
            let (mut text, shown) = cell_text(events, view.cursor.item, selected);

            let mut style = match shown {
                Some(placed) => {
                    let bg = record_color(&placed.event.color);
                    let mut style = Style::default().fg(get_contrast_text_color(bg)).bg(bg);
                    match placed.status {
                        Some(EventStatus::InProgress) => style = style.add_modifier(Modifier::BOLD),
                        Some(EventStatus::DueSoon) => style = style.add_modifier(Modifier::ITALIC),
                        None => {}
                    }
                    if view.grabbed == Some(placed.event.id.as_str()) {
                        style = style.add_modifier(Modifier::DIM);
                    }
                    style
                }
                None => match running[day_index].get(slot).copied().flatten() {
                    Some(colour) => {
                        text = "│".to_string();
                        Style::default().fg(record_color(colour)).bg(bg_color)
                    }
                    None => base,
                },
            };

            if shown.is_none() && is_now {
                text = "── now ".to_string();
                style = style.fg(NOW_COLOR);
            }
            if let Some(due) = shown.and_then(|p| due_color(p.due)) {
                // ● marker takes the due colour
                if text.starts_with('●') {
                    let rest: String = text.chars().skip(1).collect();
                    spans.push(Span::styled("●", style.fg(due)));
                    text = rest;
                    if selected {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    spans.push(Span::styled(fit(&text, col_width.saturating_sub(1)), style));
                    continue;
                }
            }
            if selected {
                if view.grabbed.is_some() && shown.is_none() {
                    text = "▸ drop here".to_string();
                }
                style = if shown.is_some() {
                    style.add_modifier(Modifier::REVERSED)
                } else {
                    Style::default().fg(highlight_fg).bg(highlight_bg)
                };
            }
            spans.push(Span::styled(fit(&format!(" {}", text.trim_start()), col_width), style));
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines).style(base), chunks[1]);

    // Detail line for the event under the cursor
    let detail = view
        .grid
        .days
        .get(view.cursor.day)
        .map(|day| day.events_at(view.cursor.slot))
        .filter(|events| !events.is_empty())
        .map(|events| describe(&events[view.cursor.item % events.len()]))
        .unwrap_or_else(|| match view.grid.cell_target(view.cursor.day, view.cursor.slot) {
            Some((date, hour)) => format!(
                "{} {} · empty",
                date.format("%a %b %-d"),
                calendar::format_hour(hour)
            ),
            None => String::new(),
        });
    f.render_widget(
        Paragraph::new(detail).style(base.add_modifier(Modifier::ITALIC)),
        chunks[2],
    );
}

/// One-line summary of an event for the detail row
fn describe(placed: &PlacedEvent) -> String {
    let event = &placed.event;
    let mut parts = vec![
        event.title.clone(),
        format!(
            "{} - {}",
            calendar::format_hour(event.start_hour),
            calendar::format_hour(event.end_hour)
        ),
        event.event_type.to_string(),
    ];
    if let Some(recurring) = &event.recurring {
        parts.push(format!("repeats {}", recurring));
    }
    match placed.status {
        Some(EventStatus::InProgress) => parts.push("in progress".to_string()),
        Some(EventStatus::DueSoon) => parts.push("starts within 24h".to_string()),
        None => {}
    }
    if let Some(due) = placed.due {
        parts.push(match due.days() {
            0 => "today".to_string(),
            1 => "in 1 day".to_string(),
            n => format!("in {} days", n),
        });
    }
    if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
        parts.push(description.lines().next().unwrap_or_default().to_string());
    }
    parts.join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Event;

    #[test]
    fn scroll_follows_the_cursor() {
        assert_eq!(scroll_to_cursor(0, 3, 10), 0);
        assert_eq!(scroll_to_cursor(0, 12, 10), 3);
        assert_eq!(scroll_to_cursor(8, 2, 10), 2);
        // never scroll past the last full page
        assert_eq!(scroll_to_cursor(20, 23, 10), 14);
        assert_eq!(scroll_to_cursor(5, 5, 40), 0);
    }

    #[test]
    fn fit_pads_and_cuts() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 3), "abc");
    }

    #[test]
    fn long_events_mark_following_rows() {
        let mut cells = vec![Vec::new(); SLOTS_PER_DAY];
        let mut event = Event::new("e1".into(), "Exam".into(), "2024-06-12".into(), 9, 12);
        event.color = "pink".into();
        cells[4].push(PlacedEvent {
            event,
            due: None,
            status: None,
        });
        let running = continuation_colors(&cells);
        assert_eq!(running[4], None);
        assert_eq!(running[5], Some("pink"));
        assert_eq!(running[6], Some("pink"));
        assert_eq!(running[7], None);
    }
}
