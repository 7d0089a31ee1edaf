use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::controller::{EventDraft, Form, NotebookDraft, StickyDraft, TaskDraft};
use crate::models::{COLORS, EventType, Priority, RECURRENCES};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color, record_color};
use crate::tui::widgets::popup_area;

/// How a form field takes input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    /// Free text typed character by character
    Text,
    /// A fixed set of options cycled with Left/Right
    Choice,
}

/// Field-by-field access to a draft for the form popup
pub trait FormFields {
    const TITLE: &'static str;
    const LABELS: &'static [&'static str];

    fn input(&self, field: usize) -> FieldInput;
    fn value(&self, field: usize) -> String;
    fn text_mut(&mut self, field: usize) -> Option<&mut String>;
    fn cycle(&mut self, field: usize, forward: bool);

    /// Called after a text field changed
    fn after_edit(&mut self, _field: usize) {}

    /// Colour swatch shown next to the value, if the field is a colour
    fn swatch(&self, _field: usize) -> Option<&str> {
        None
    }

    fn insert_char(&mut self, field: usize, c: char) {
        if let Some(text) = self.text_mut(field) {
            text.push(c);
            self.after_edit(field);
        }
    }

    fn backspace(&mut self, field: usize) {
        if let Some(text) = self.text_mut(field) {
            text.pop();
            self.after_edit(field);
        }
    }
}

/// Step `value` through `options`; unknown values restart at the first option
fn cycle_str(value: &mut String, options: &[&str], forward: bool) {
    let len = options.len();
    if len == 0 {
        return;
    }
    let next = match options.iter().position(|o| *o == value.as_str()) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    *value = options[next].to_string();
}

fn cycle_index(current: usize, len: usize, forward: bool) -> usize {
    if forward { (current + 1) % len } else { (current + len - 1) % len }
}

impl FormFields for EventDraft {
    const TITLE: &'static str = "Event";
    const LABELS: &'static [&'static str] = &[
        "Title",
        "Type",
        "Date",
        "Start hour",
        "End hour",
        "Color",
        "Repeats",
        "Description",
    ];

    fn input(&self, field: usize) -> FieldInput {
        match field {
            1 | 5 | 6 => FieldInput::Choice,
            _ => FieldInput::Text,
        }
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.title.clone(),
            1 => self.event_type.to_string(),
            2 => self.date.clone(),
            3 => self.start_hour.clone(),
            4 => self.end_hour.clone(),
            5 => self.color.clone(),
            6 => self.recurring.clone(),
            7 => self.description.clone(),
            _ => String::new(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.title),
            2 => Some(&mut self.date),
            3 => Some(&mut self.start_hour),
            4 => Some(&mut self.end_hour),
            7 => Some(&mut self.description),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        match field {
            1 => {
                let all = EventType::ALL;
                let current = all.iter().position(|t| *t == self.event_type).unwrap_or(0);
                self.event_type = all[cycle_index(current, all.len(), forward)];
            }
            5 => cycle_str(&mut self.color, COLORS, forward),
            6 => cycle_str(&mut self.recurring, RECURRENCES, forward),
            _ => {}
        }
    }

    fn after_edit(&mut self, field: usize) {
        if field == 3 {
            let start = self.start_hour.clone();
            self.set_start_hour(start);
        }
    }

    fn swatch(&self, field: usize) -> Option<&str> {
        (field == 5).then_some(self.color.as_str())
    }
}

impl FormFields for TaskDraft {
    const TITLE: &'static str = "Task";
    const LABELS: &'static [&'static str] =
        &["Title", "Due date", "Priority", "Course", "Description"];

    fn input(&self, field: usize) -> FieldInput {
        if field == 2 { FieldInput::Choice } else { FieldInput::Text }
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.title.clone(),
            1 => self.due_date.clone(),
            2 => self
                .priority
                .map(|p| p.label().to_string())
                .unwrap_or_default(),
            3 => self.course.clone(),
            4 => self.description.clone(),
            _ => String::new(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.title),
            1 => Some(&mut self.due_date),
            3 => Some(&mut self.course),
            4 => Some(&mut self.description),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        if field != 2 {
            return;
        }
        let all = Priority::ALL;
        self.priority = Some(match self.priority {
            Some(p) => {
                let current = all.iter().position(|x| *x == p).unwrap_or(0);
                all[cycle_index(current, all.len(), forward)]
            }
            None => all[0],
        });
    }
}

impl FormFields for NotebookDraft {
    const TITLE: &'static str = "Notebook";
    const LABELS: &'static [&'static str] = &["Title", "Subject", "Color", "Description"];

    fn input(&self, field: usize) -> FieldInput {
        if field == 2 { FieldInput::Choice } else { FieldInput::Text }
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.title.clone(),
            1 => self.subject.clone(),
            2 => self.color.clone(),
            3 => self.description.clone(),
            _ => String::new(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.title),
            1 => Some(&mut self.subject),
            3 => Some(&mut self.description),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        if field == 2 {
            cycle_str(&mut self.color, COLORS, forward);
        }
    }

    fn swatch(&self, field: usize) -> Option<&str> {
        (field == 2).then_some(self.color.as_str())
    }
}

impl FormFields for StickyDraft {
    const TITLE: &'static str = "Sticky Note";
    const LABELS: &'static [&'static str] = &["Title", "Content", "Color"];

    fn input(&self, field: usize) -> FieldInput {
        if field == 2 { FieldInput::Choice } else { FieldInput::Text }
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.title.clone(),
            1 => self.content.clone(),
            2 => self.color.clone(),
            _ => String::new(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.title),
            1 => Some(&mut self.content),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        if field == 2 {
            cycle_str(&mut self.color, COLORS, forward);
        }
    }

    fn swatch(&self, field: usize) -> Option<&str> {
        (field == 2).then_some(self.color.as_str())
    }
}

/// Render an open form as a centered popup, one labelled row per field
pub fn render_form<D: FormFields>(
    f: &mut Frame,
    area: Rect,
    form: &Form<D>,
    current_field: usize,
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);
    let base = Style::default().fg(fg_color).bg(bg_color);

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let label_width = D::LABELS.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut lines: Vec<Line> = Vec::new();

    for (index, label) in D::LABELS.iter().enumerate() {
        let selected = index == current_field;
        let draft = &form.draft;
        let mut value = draft.value(index);
        match draft.input(index) {
            FieldInput::Choice => value = format!("< {} >", value),
            FieldInput::Text if selected => value.push('_'),
            FieldInput::Text => {}
        }

        let label_style = if selected {
            Style::default()
                .fg(highlight_fg)
                .bg(highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            base.add_modifier(Modifier::BOLD)
        };

        let mut spans = vec![
            Span::styled(format!(" {:<width$} ", label, width = label_width), label_style),
            Span::styled(" ", base),
            Span::styled(value, base),
        ];
        if let Some(colour) = draft.swatch(index) {
            spans.push(Span::styled(" ", base));
            spans.push(Span::styled("    ", Style::default().bg(record_color(colour))));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!("! {}", error),
            Style::default().fg(ratatui::style::Color::LightRed).bg(bg_color),
        )));
    }

    let title = if form.is_edit() {
        format!("Edit {}", D::TITLE)
    } else {
        format!("New {}", D::TITLE)
    };
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center)
                .style(base),
        )
        .style(base);

    f.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_date;

    #[test]
    fn typing_a_start_hour_moves_the_end() {
        let mut draft = EventDraft::at(parse_date("2024-06-12").unwrap(), 9);
        draft.backspace(3);
        draft.insert_char(3, '1');
        draft.insert_char(3, '4');
        assert_eq!(draft.start_hour, "14");
        assert_eq!(draft.end_hour, "15");
    }

    #[test]
    fn choice_fields_cycle_both_ways() {
        let mut draft = EventDraft::at(parse_date("2024-06-12").unwrap(), 9);
        draft.cycle(5, true);
        assert_eq!(draft.color, "pink");
        draft.cycle(5, false);
        draft.cycle(5, false);
        assert_eq!(draft.color, "purple");

        let mut task = TaskDraft {
            priority: None,
            ..TaskDraft::default()
        };
        task.cycle(2, true);
        assert_eq!(task.priority, Some(Priority::High));
        task.cycle(2, false);
        assert_eq!(task.priority, Some(Priority::Low));
    }

    #[test]
    fn choice_fields_ignore_typing() {
        let mut note = StickyDraft::default();
        note.insert_char(2, 'x');
        assert_eq!(note.color, "lavender");
        note.insert_char(1, 'h');
        assert_eq!(note.content, "h");
    }
}
