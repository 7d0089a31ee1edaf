use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Wrap,
};
use ratskin::RatSkin;
use std::cmp;
use termimad::minimad::Text as MinimadText;

use crate::Config;
use crate::models::{Notebook, StickyNote};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color, record_color};

/// A card on the notes board
pub trait BoardItem {
    fn list_title(&self) -> String;
    fn color(&self) -> &str;
    /// Markdown shown in the detail pane
    fn markdown(&self) -> String;
}

impl BoardItem for Notebook {
    fn list_title(&self) -> String {
        match self.subject.as_deref().filter(|s| !s.is_empty()) {
            Some(subject) => format!("{} · {}", self.title, subject),
            None => self.title.clone(),
        }
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn markdown(&self) -> String {
        let mut content = format!("# {}\n", self.title);
        if let Some(subject) = &self.subject {
            content.push_str(&format!("**Subject:** {}\n", subject));
        }
        content.push_str(&format!("**Pages:** {}\n", self.page_count));
        if !self.created_at.is_empty() {
            content.push_str(&format!("**Created:** {}\n", self.created_at));
        }
        if let Some(description) = &self.description {
            content.push('\n');
            content.push_str(description);
            content.push('\n');
        }
        content
    }
}

impl BoardItem for StickyNote {
    fn list_title(&self) -> String {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => self.content.lines().next().unwrap_or_default().to_string(),
        }
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn markdown(&self) -> String {
        let mut content = String::new();
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            content.push_str(&format!("# {}\n\n", title));
        }
        content.push_str(&self.content);
        content.push('\n');
        content
    }
}

/// State the board needs from the app
pub struct BoardPane<'a> {
    pub title: &'a str,
    pub empty_message: &'a str,
    pub query: &'a str,
    pub searching: bool,
    pub detail_scroll: usize,
}

/// Search line, item list, and markdown detail of the selected item
pub fn render_board<T: BoardItem>(
    f: &mut Frame,
    area: Rect,
    items: &[&T],
    pane: &BoardPane,
    list_state: &mut ListState,
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);
    let base = Style::default().fg(fg_color).bg(bg_color);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let search_style = if pane.searching {
        Style::default().fg(highlight_bg).bg(bg_color)
    } else {
        base
    };
    let cursor = if pane.searching { "_" } else { "" };
    let search = Paragraph::new(format!("{}{}", pane.query, cursor))
        .block(Block::default().borders(Borders::ALL).title(" Search "))
        .style(search_style);
    f.render_widget(search, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    let list_title = format!(" {} ({}) ", pane.title, items.len());
    let block = Block::default().borders(Borders::ALL).title(list_title).style(base);

    if items.is_empty() {
        let empty = Paragraph::new(pane.empty_message)
            .block(block)
            .style(base.add_modifier(Modifier::ITALIC))
            .wrap(Wrap { trim: true });
        f.render_widget(empty, columns[0]);
        f.render_widget(
            Block::default().borders(Borders::ALL).style(base),
            columns[1],
        );
        return;
    }

    let max_width = columns[0].width.saturating_sub(6) as usize;
    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| {
            let mut title = item.list_title();
            if title.chars().count() > max_width {
                title = title.chars().take(max_width.saturating_sub(3)).collect::<String>() + "...";
            }
            ListItem::new(Line::from(vec![
                Span::styled("▌", Style::default().fg(record_color(item.color()))),
                Span::raw(" "),
                Span::raw(title),
            ]))
        })
        .collect();

    let list = List::new(list_items)
        .block(block)
        .style(base)
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, columns[0], list_state);

    if let Some(item) = list_state.selected().and_then(|i| items.get(i)) {
        render_detail(f, columns[1], &item.markdown(), item.color(), pane.detail_scroll, config);
    }
}

/// Markdown rendered through ratskin with a scrollbar when it overflows
fn render_detail(f: &mut Frame, area: Rect, markdown: &str, color: &str, scroll_offset: usize, config: &Config) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let content_area = horizontal[0];
    let scrollbar_area = horizontal[1];

    let viewport_height = (area.height - 2) as usize;
    let text_width: u16 = content_area.width.saturating_sub(2);

    let content_lines = RatSkin::default().parse(MinimadText::from(markdown), text_width);
    let lines: Vec<Line> = content_lines
        .into_iter()
        .map(|line| {
            let spans: Vec<Span> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect();
            Line::from(spans)
        })
        .collect();

    let total_lines = lines.len();
    let max_scroll = total_lines.saturating_sub(viewport_height);
    let scroll_offset = cmp::min(scroll_offset, max_scroll);
    let end_line = cmp::min(scroll_offset + viewport_height, total_lines);
    let visible = if scroll_offset < total_lines {
        Text::from(lines[scroll_offset..end_line].to_vec())
    } else {
        Text::default()
    };

    let base_style = Style::default().fg(parse_color(&config.get_active_theme().fg));
    let paragraph = Paragraph::new(visible)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(record_color(color))),
        )
        .style(base_style)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .viewport_content_length(viewport_height)
            .position(scroll_offset);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
