pub mod help_overlay;
pub mod popups;
pub mod status_row;
pub mod task_list;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::controller::Snapshot;
use crate::model::config::ThemeVariant;

use super::app::{App, Mode};

/// Main render function: header, filter line, task list, status row, then overlays
pub fn render(frame: &mut Frame, app: &App, snapshot: &Snapshot) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // stats header
            Constraint::Length(1), // search + filters
            Constraint::Min(1),    // task list
            Constraint::Length(1), // status row
        ])
        .split(area);

    render_header(frame, app, snapshot, chunks[0]);
    render_filter_line(frame, app, snapshot, chunks[1]);
    task_list::render_task_list(frame, app, snapshot, chunks[2]);
    status_row::render_status_row(frame, app, chunks[3]);

    match app.mode {
        Mode::Help => help_overlay::render_help_overlay(frame, app, area),
        Mode::Form => popups::render_form_popup(frame, app, area),
        Mode::Confirm => popups::render_confirm_popup(frame, app, area),
        _ => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let title = match theme.variant {
        ThemeVariant::Plain => " taskdeck ",
        ThemeVariant::Neon => " \u{25C6} TASKDECK \u{25C6} ",
    };
    let stats = &snapshot.stats;
    let mut spans = vec![
        Span::styled(
            title,
            Style::default()
                .fg(theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " {} total  {} pending  {} done  {}%",
                stats.total, stats.pending, stats.completed, stats.completion_rate
            ),
            Style::default().fg(theme.text).bg(bg),
        ),
    ];
    if snapshot.loading {
        spans.push(Span::styled(
            "  loading\u{2026}",
            Style::default().fg(theme.yellow).bg(bg),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)), area);
}

fn render_filter_line(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let dim = Style::default().fg(theme.dim).bg(bg);
    let value = Style::default().fg(theme.text_bright).bg(bg);

    let search = if app.mode == Mode::Search {
        app.input.text().to_string()
    } else {
        snapshot.filter.search.clone()
    };
    let mut spans = vec![
        Span::styled(" search: ", dim),
        Span::styled(if search.is_empty() { "-".to_string() } else { search }, value),
        Span::styled("  status: ", dim),
        Span::styled(snapshot.filter.status.to_string(), value),
        Span::styled("  priority: ", dim),
        Span::styled(snapshot.filter.priority.to_string(), value),
    ];
    if !snapshot.selection.is_empty() {
        spans.push(Span::styled(
            format!("  {} selected", snapshot.selection.len()),
            Style::default().fg(theme.cyan).bg(bg),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)), area);
}

/// Centered rectangle of fixed size, clipped to `area`
pub(super) fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}
