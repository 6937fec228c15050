use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::router::{Command, SHORTCUTS};
use crate::tui::app::App;

use super::centered_rect_fixed;

const SECTIONS: [&str; 4] = ["Tasks", "Navigation", "Selection", "General"];

fn section_of(command: Command) -> &'static str {
    match command {
        Command::NewTask
        | Command::Edit
        | Command::DeleteFocused
        | Command::ToggleComplete => "Tasks",
        Command::NavigateUp
        | Command::NavigateDown
        | Command::FocusSearch
        | Command::CycleStatusFilter
        | Command::CyclePriorityFilter => "Navigation",
        Command::ToggleSelect
        | Command::SelectAll
        | Command::DeselectAll
        | Command::BulkComplete
        | Command::BulkUncomplete
        | Command::BulkDelete
        | Command::BulkSetPriority(_) => "Selection",
        Command::ShowHelp
        | Command::Export
        | Command::Import
        | Command::Reload
        | Command::Quit => "General",
    }
}

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    for section in SECTIONS {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {section}"), header_style)));
        for (key, command) in SHORTCUTS.iter().filter(|(_, c)| section_of(*c) == section) {
            add_binding(&mut lines, key, command.describe(), key_style, desc_style);
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Press any key to close",
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    let overlay_area = centered_rect_fixed(54, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 16;
    let padded_key = format!(" {:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}
