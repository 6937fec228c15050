use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::text::{display_width, truncate_to_width};

/// Render the status row (bottom of screen): a mode prompt, else the newest
/// live toast, else key hints
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let width = area.width as usize;
    let dim = Style::default().fg(theme.dim).bg(bg);
    let bright = Style::default().fg(theme.text_bright).bg(bg);
    let cursor = Span::styled("\u{258C}", Style::default().fg(theme.highlight).bg(bg));

    let (mut spans, hint) = match app.mode {
        Mode::Search => (
            vec![Span::styled(format!("/{}", app.input.text()), bright), cursor],
            "Enter done  Esc clear",
        ),
        Mode::ImportPath => (
            vec![
                Span::styled("import from: ", dim),
                Span::styled(app.input.text().to_string(), bright),
                cursor,
            ],
            "Enter import  Esc cancel",
        ),
        Mode::Export => (
            vec![Span::styled("export as: (j)son  (c)sv", bright)],
            "any other key cancels",
        ),
        Mode::Form => (Vec::new(), "Tab next field  Enter save  Esc cancel"),
        Mode::Confirm => (Vec::new(), "y confirm  n cancel"),
        Mode::Help => (Vec::new(), ""),
        Mode::Navigate => match app.toasts.active().pop() {
            Some(toast) => {
                let style = Style::default().fg(theme.severity_color(toast.severity)).bg(bg);
                (vec![Span::styled(truncate_to_width(&toast.message, width), style)], "")
            }
            None => (Vec::new(), "? help"),
        },
    };

    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(hint);
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, dim));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use crate::notify::{NotificationSink, Severity};
    use crate::tui::app::Mode;
    use crate::tui::render::test_helpers::*;

    fn last_line(out: &str) -> &str {
        out.lines().last().unwrap()
    }

    #[tokio::test]
    async fn test_navigate_shows_latest_toast() {
        let app = sample_app().await;
        app.toasts.clear();
        let out = render_app(&app, TERM_W, TERM_H);
        assert!(last_line(&out).ends_with("? help"));

        app.toasts.notify(Severity::Success, "Task deleted!");
        let out = render_app(&app, TERM_W, TERM_H);
        assert_eq!(last_line(&out), "Task deleted!");
    }

    #[tokio::test]
    async fn test_search_prompt_echoes_input() {
        let mut app = sample_app().await;
        app.mode = Mode::Search;
        app.input.set("rev");
        let out = render_app(&app, TERM_W, TERM_H);
        assert!(last_line(&out).starts_with("/rev\u{258C}"));
        assert!(last_line(&out).ends_with("Enter done  Esc clear"));
    }

    #[tokio::test]
    async fn test_export_prompt() {
        let mut app = sample_app().await;
        app.mode = Mode::Export;
        let out = render_app(&app, TERM_W, TERM_H);
        assert!(last_line(&out).starts_with("export as: (j)son  (c)sv"));
    }
}
