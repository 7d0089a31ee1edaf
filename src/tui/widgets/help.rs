use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(Style::default().fg(fg_color).bg(bg_color)),
        )
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let k = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!(
        "  {} / {} / {} / {}: Calendar, Tasks, Notebooks, Sticky Notes\n",
        key(&k.tab_1),
        key(&k.tab_2),
        key(&k.tab_3),
        key(&k.tab_4)
    ));
    text.push_str("  Arrow keys: Move the cursor\n");
    text.push_str(&format!(
        "  {} / {}: Previous / next week\n",
        key(&k.prev_week),
        key(&k.next_week)
    ));
    text.push_str(&format!("  {}: Jump to this week\n\n", key(&k.today)));

    text.push_str("Calendar:\n");
    text.push_str("  Enter: Open event, or new event at the cursor\n");
    text.push_str("  Tab: Next event in the same hour\n");
    text.push_str(&format!("  {}: Quick add at the current hour\n", key(&k.quick_add)));
    text.push_str(&format!(
        "  {} / {} / {} / {}: New class / assignment / exam / study session\n",
        key(&k.class_preset),
        key(&k.assignment_preset),
        key(&k.exam_preset),
        key(&k.study_preset)
    ));
    text.push_str(&format!(
        "  {}: Grab the event, move, then {} again to drop (Esc cancels)\n\n",
        key(&k.grab),
        key(&k.grab)
    ));

    text.push_str("Tasks:\n");
    text.push_str(&format!("  {}: Toggle completed\n", key(&k.toggle)));
    text.push_str(&format!(
        "  {} / {} / {}: Cycle priority filter / status filter / sort\n\n",
        key(&k.cycle_priority),
        key(&k.cycle_status),
        key(&k.cycle_sort)
    ));

    text.push_str("Notebooks and Sticky Notes:\n");
    text.push_str(&format!("  {}: Search\n\n", key(&k.search)));

    text.push_str("Items:\n");
    text.push_str(&format!("  {}: New\n", key(&k.new)));
    text.push_str(&format!("  {}: Edit\n", key(&k.edit)));
    text.push_str(&format!("  {}: Delete (asks first)\n\n", key(&k.delete)));

    text.push_str("Forms:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  Left / Right: Change a choice field\n");
    text.push_str("  Enter: Save\n");
    text.push_str("  Esc: Cancel\n\n");

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", key(&k.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&k.help)));

    text
}
