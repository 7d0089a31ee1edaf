use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};

use crate::controller::ModalKind;
use crate::tui::app::{Mode, Tab};
use crate::tui::widgets::{
    board::{BoardPane, render_board},
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::render_form,
    help::render_help,
    status_bar::render_status_bar,
    tabs::render_tabs,
    task_list::render_task_list,
    week_grid::{GridView, render_week_grid},
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Lavender")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    render_tabs(f, layout.tabs_area, app.ui.current_tab, &app.config);

    match app.ui.current_tab {
        Tab::Calendar => {
            let semester = app.semester_progress();
            let view = GridView {
                grid: &app.grid,
                cursor: app.ui.cursor,
                grabbed: app.ui.grabbed.as_deref(),
                today: app.planner.today(),
                semester,
            };
            render_week_grid(f, layout.main_area, &view, &mut app.ui.grid_scroll, &app.config);
        }
        Tab::Tasks => {
            let tasks = app.planner.visible_tasks();
            render_task_list(
                f,
                layout.main_area,
                &tasks,
                app.planner.store().tasks(),
                app.planner.task_query(),
                &mut app.ui.task_list,
                app.planner.today(),
                &app.config,
            );
        }
        Tab::Notebooks => {
            let board = app.planner.board();
            let pane = BoardPane {
                title: "Notebooks",
                empty_message: board.notebooks_empty_message(),
                query: app.planner.note_search(),
                searching: app.ui.mode == Mode::Search,
                detail_scroll: app.ui.detail_scroll,
            };
            render_board(f, layout.main_area, &board.notebooks, &pane, &mut app.ui.notebook_list, &app.config);
        }
        Tab::StickyNotes => {
            let board = app.planner.board();
            let pane = BoardPane {
                title: "Sticky Notes",
                empty_message: board.sticky_notes_empty_message(),
                query: app.planner.note_search(),
                searching: app.ui.mode == Mode::Search,
                detail_scroll: app.ui.detail_scroll,
            };
            render_board(f, layout.main_area, &board.sticky_notes, &pane, &mut app.ui.sticky_list, &app.config);
        }
    }

    // Overlays, topmost last
    let field = app.ui.form_field;
    match app.planner.open_modal() {
        Some(ModalKind::Event) => {
            if let Some(form) = app.planner.event_modal.form() {
                render_form(f, layout.main_area, form, field, &app.config);
            }
        }
        Some(ModalKind::Task) => {
            if let Some(form) = app.planner.task_modal.form() {
                render_form(f, layout.main_area, form, field, &app.config);
            }
        }
        Some(ModalKind::Notebook) => {
            if let Some(form) = app.planner.notebook_modal.form() {
                render_form(f, layout.main_area, form, field, &app.config);
            }
        }
        Some(ModalKind::Sticky) => {
            if let Some(form) = app.planner.sticky_modal.form() {
                render_form(f, layout.main_area, form, field, &app.config);
            }
        }
        None => {}
    }

    if let Some(pending) = app.planner.pending_delete() {
        render_confirm_delete(f, layout.main_area, pending, app.ui.delete_selection, &app.config);
    }

    if app.ui.mode == Mode::Help {
        render_help(f, layout.main_area, &app.config);
    }

    let hints = key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &hints, &app.config);
}

/// Key hints for the status bar, most useful first
pub fn key_hints(app: &App) -> Vec<String> {
    let k = &app.config.key_bindings;
    let hint = |binding: &str, label: &str| format!("{}: {}", key(binding), label);

    if app.planner.pending_delete().is_some() {
        return vec![
            "Enter: Confirm".to_string(),
            "Esc: Cancel".to_string(),
            "←/→: Choose".to_string(),
        ];
    }
    if app.planner.open_modal().is_some() {
        return vec![
            "Enter: Save".to_string(),
            "Esc: Cancel".to_string(),
            "Tab/↑/↓: Field".to_string(),
            "←/→: Change option".to_string(),
        ];
    }
    match app.ui.mode {
        Mode::Search => {
            return vec!["Enter: Done".to_string(), "Esc: Clear search".to_string()];
        }
        Mode::Help => return vec!["Esc: Close help".to_string()],
        Mode::View => {}
    }

    let mut hints = Vec::new();
    match app.ui.current_tab {
        Tab::Calendar => {
            if app.ui.grabbed.is_some() {
                hints.push(hint(&k.grab, "Drop"));
                hints.push("Esc: Cancel move".to_string());
            } else {
                hints.push(hint(&k.grab, "Move"));
            }
            hints.push(hint(&k.new, "New"));
            hints.push(hint(&k.quick_add, "Quick add"));
            hints.push("Enter: Open".to_string());
            hints.push(hint(&k.prev_week, "Prev week"));
            hints.push(hint(&k.next_week, "Next week"));
            hints.push(hint(&k.today, "Today"));
            hints.push(hint(&k.delete, "Delete"));
        }
        Tab::Tasks => {
            hints.push(hint(&k.toggle, "Done"));
            hints.push(hint(&k.new, "New"));
            hints.push(hint(&k.edit, "Edit"));
            hints.push(hint(&k.delete, "Delete"));
            hints.push(hint(&k.cycle_priority, "Priority"));
            hints.push(hint(&k.cycle_status, "Status"));
            hints.push(hint(&k.cycle_sort, "Sort"));
        }
        Tab::Notebooks | Tab::StickyNotes => {
            hints.push(hint(&k.new, "New"));
            hints.push(hint(&k.edit, "Edit"));
            hints.push(hint(&k.delete, "Delete"));
            hints.push(hint(&k.search, "Search"));
        }
    }
    hints.push(hint(&k.help, "Help"));
    hints.push(hint(&k.quit, "Quit"));
    hints
}
