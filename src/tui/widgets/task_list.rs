use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph};

use crate::Config;
use crate::models::Task;
use crate::tasks::{TaskQuery, TaskStats, due_label};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color, priority_color};

fn truncate(text: String, max_width: usize) -> String {
    if text.chars().count() > max_width {
        text.chars().take(max_width.saturating_sub(3)).collect::<String>() + "..."
    } else {
        text
    }
}

/// One list row: status mark, title, course, due label
pub fn task_line(task: &Task, today: NaiveDate, max_width: usize) -> String {
    let status_indicator = if task.completed { "✓" } else { "○" };
    let course = task
        .course
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| format!(" ({})", c))
        .unwrap_or_default();
    let due = due_label(task.due_date.as_deref(), today);
    truncate(
        format!("{} {}{} [{}]", status_indicator, task.title, course, due),
        max_width,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn render_task_list(
    f: &mut Frame,
    area: Rect,
    tasks: &[&Task],
    all_tasks: &[Task],
    query: TaskQuery,
    list_state: &mut ListState,
    today: NaiveDate,
    config: &Config,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };
    let base = Style::default().fg(fg_color).bg(bg_color);

    // Account for borders and padding
    let max_width = chunks[0].width.saturating_sub(4) as usize;
    let title = format!(" Tasks ({}/{}) ", tasks.len(), all_tasks.len());
    let block = Block::default().borders(Borders::ALL).title(title).style(base);

    if tasks.is_empty() {
        let hint = Paragraph::new(query.empty_hint())
            .block(block)
            .style(base.add_modifier(Modifier::ITALIC));
        f.render_widget(hint, chunks[0]);
    } else {
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|task| {
                let mut style = base.fg(priority_color(task.priority));
                if task.completed {
                    style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
                }
                ListItem::new(task_line(task, today, max_width)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .style(base)
            .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, chunks[0], list_state);
    }

    render_stats(f, chunks[1], all_tasks, query, config);
}

/// Counts, progress gauge and the active query
fn render_stats(f: &mut Frame, area: Rect, all_tasks: &[Task], query: TaskQuery, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let base = Style::default().fg(fg_color).bg(bg_color);

    let stats = TaskStats::compute(all_tasks);
    let block = Block::default().borders(Borders::ALL).title(" Overview ").style(base);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let counts = vec![
        Line::from(vec![
            Span::styled("High    ", base.fg(priority_color(crate::models::Priority::High))),
            Span::styled(stats.counts.high.to_string(), base),
        ]),
        Line::from(vec![
            Span::styled("Medium  ", base.fg(priority_color(crate::models::Priority::Medium))),
            Span::styled(stats.counts.medium.to_string(), base),
        ]),
        Line::from(vec![
            Span::styled("Low     ", base.fg(priority_color(crate::models::Priority::Low))),
            Span::styled(stats.counts.low.to_string(), base),
        ]),
        Line::from(""),
        Line::from(format!("Completed {}/{}", stats.completed, stats.total)),
    ];
    f.render_widget(Paragraph::new(counts).style(base), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(highlight_bg).bg(bg_color))
        .percent(stats.progress as u16)
        .label(format!("{}%", stats.progress));
    f.render_widget(gauge, rows[1]);

    let summary = Paragraph::new(query.summary())
        .style(base.add_modifier(Modifier::ITALIC))
        .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(summary, rows[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::utils::parse_date;

    #[test]
    fn line_shows_status_course_and_due() {
        let today = parse_date("2024-06-12").unwrap();
        let mut task = Task::new("t1".into(), "Essay".into(), Priority::High);
        task.course = Some("ENG 101".into());
        task.due_date = Some("2024-06-13".into());
        assert_eq!(task_line(&task, today, 80), "○ Essay (ENG 101) [Tomorrow]");

        task.completed = true;
        task.course = None;
        task.due_date = None;
        assert_eq!(task_line(&task, today, 80), "✓ Essay [No date]");
    }

    #[test]
    fn long_lines_are_truncated() {
        let today = parse_date("2024-06-12").unwrap();
        let task = Task::new("t1".into(), "A very long task title".into(), Priority::Low);
        assert_eq!(task_line(&task, today, 10), "○ A ver...");
    }
}
