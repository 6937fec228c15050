use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::controller::Snapshot;
use crate::model::task::{Priority, Task};
use crate::tui::app::App;
use crate::util::text::{display_width, fit_to_width};

/// Width of the checkbox + selection + id + priority prefix
const PREFIX_W: usize = 16;
const DUE_W: usize = 11;

fn priority_glyph(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!!",
        Priority::Medium => "!! ",
        Priority::Low => "!  ",
    }
}

/// Render the filtered task list, keeping the focused row in view
pub fn render_task_list(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let height = area.height as usize;
    let width = area.width as usize;

    if snapshot.visible.is_empty() {
        let msg = if snapshot.loading {
            "  Loading tasks\u{2026}"
        } else if snapshot.stats.total == 0 {
            "  No tasks yet. Press n to create one."
        } else {
            "  No tasks match the current filters."
        };
        let line = Line::from(Span::styled(msg, Style::default().fg(theme.dim).bg(bg)));
        frame.render_widget(Paragraph::new(vec![Line::default(), line]).style(Style::default().bg(bg)), area);
        return;
    }

    let focus = snapshot.focus;
    let scroll = match focus {
        Some(f) if height > 0 && f >= height => f + 1 - height,
        _ => 0,
    };

    let lines: Vec<Line> = snapshot
        .visible
        .iter()
        .enumerate()
        .skip(scroll)
        .take(height)
        .map(|(i, task)| render_row(app, snapshot, task, focus == Some(i), width))
        .collect();

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn render_row<'a>(app: &App, snapshot: &Snapshot, task: &'a Task, focused: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let row_bg = if focused { theme.selection_bg } else { theme.background };
    let base = Style::default().bg(row_bg);

    let check = if task.completed { "[x]" } else { "[ ]" };
    let marker = if snapshot.pending.contains(&task.id) {
        "~"
    } else if snapshot.selection.contains(&task.id) {
        "*"
    } else {
        " "
    };
    let title_style = if task.completed {
        base.fg(theme.dim).add_modifier(Modifier::CROSSED_OUT)
    } else if focused {
        base.fg(theme.text_bright).add_modifier(Modifier::BOLD)
    } else {
        base.fg(theme.text)
    };

    let due = task
        .due_at
        .map(|d| format!(" {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    let title_w = width.saturating_sub(PREFIX_W + if due.is_empty() { 0 } else { DUE_W });
    let title = fit_to_width(&task.title, title_w);

    let id = format!("#{}", task.id);
    let mut spans = vec![
        Span::styled(format!(" {check}"), base.fg(theme.text)),
        Span::styled(marker, base.fg(theme.cyan)),
        Span::styled(format!("{id:>5} "), base.fg(theme.dim)),
        Span::styled(priority_glyph(task.priority), base.fg(theme.priority_color(task.priority))),
        Span::styled("  ", base),
        Span::styled(title, title_style),
    ];
    if !due.is_empty() {
        spans.push(Span::styled(due, base.fg(theme.dim)));
    }
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), base));
    }
    Line::from(spans)
}
