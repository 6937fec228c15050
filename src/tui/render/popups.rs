use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::task::Priority;
use crate::tui::app::App;
use crate::tui::input::{FormField, TextInput};
use crate::tui::theme::Theme;
use crate::util::text::truncate_to_width;

use super::centered_rect_fixed;

const LABEL_W: usize = 13;

/// Render the create/edit form popup
pub fn render_form_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;
    let popup_w: u16 = 60.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;
    let field_w = inner_w.saturating_sub(LABEL_W + 2);

    let header_style = Style::default()
        .fg(theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", form.heading()), header_style)),
        Line::from(""),
        text_field(theme, "Title", &form.title, form.field == FormField::Title, field_w),
        text_field(
            theme,
            "Description",
            &form.description,
            form.field == FormField::Description,
            field_w,
        ),
    ];

    let label_style = field_label_style(theme, form.field == FormField::Priority);
    let mut priority_spans = vec![Span::styled(format!(" {:<LABEL_W$}", "Priority"), label_style)];
    for p in Priority::ALL {
        let style = if p == form.priority {
            Style::default()
                .fg(theme.priority_color(p))
                .bg(bg)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(theme.dim).bg(bg)
        };
        priority_spans.push(Span::styled(format!(" {p} "), style));
        priority_spans.push(Span::styled(" ", Style::default().bg(bg)));
    }
    lines.push(Line::from(priority_spans));

    let popup_h = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let overlay_area = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        overlay_area,
    );
}

fn field_label_style(theme: &Theme, focused: bool) -> Style {
    let style = Style::default().bg(theme.background);
    if focused {
        style.fg(theme.text_bright).add_modifier(Modifier::BOLD)
    } else {
        style.fg(theme.dim)
    }
}

fn text_field<'a>(theme: &Theme, label: &str, input: &TextInput, focused: bool, width: usize) -> Line<'a> {
    let bg = theme.background;
    let text_style = Style::default().fg(theme.text_bright).bg(bg);
    let mut spans = vec![Span::styled(
        format!(" {label:<LABEL_W$}"),
        field_label_style(theme, focused),
    )];
    if focused {
        let (before, after) = input.text().split_at(input.cursor());
        spans.push(Span::styled(truncate_to_width(before, width), text_style));
        spans.push(Span::styled(
            "\u{258C}",
            Style::default().fg(theme.highlight).bg(bg),
        ));
        spans.push(Span::styled(after.to_string(), text_style));
    } else {
        spans.push(Span::styled(truncate_to_width(input.text(), width), text_style));
    }
    Line::from(spans)
}

/// Render the y/n confirmation popup for destructive actions
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(confirm) = &app.confirm else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;
    let prompt = confirm.prompt();
    let popup_w = (prompt.chars().count() as u16 + 4).min(area.width.saturating_sub(2));

    let lines = vec![
        Line::from(Span::styled(
            format!(" {prompt}"),
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y", Style::default().fg(theme.red).bg(bg).add_modifier(Modifier::BOLD)),
            Span::styled(" delete   ", Style::default().fg(theme.text).bg(bg)),
            Span::styled("n", Style::default().fg(theme.highlight).bg(bg).add_modifier(Modifier::BOLD)),
            Span::styled(" cancel", Style::default().fg(theme.text).bg(bg)),
        ]),
    ];

    let overlay_area = centered_rect_fixed(popup_w, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, overlay_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.red).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        overlay_area,
    );
}
