use std::path::PathBuf;
use std::sync::Arc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::controller::TaskController;
use crate::gateway::{MemoryGateway, TaskGateway};
use crate::notify::ToastQueue;
use crate::tui::app::{App, DashController};
use crate::tui::theme::Theme;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Full-screen render of the dashboard
pub fn render_app(app: &App, w: u16, h: u16) -> String {
    let snapshot = app.controller.snapshot();
    render_to_string(w, h, |frame, _| super::render(frame, app, &snapshot))
}

/// Dashboard loaded with the three sample tasks. Must run inside a tokio runtime.
pub async fn sample_app() -> App {
    let toasts = Arc::new(ToastQueue::new());
    let gateway: Arc<dyn TaskGateway> = Arc::new(MemoryGateway::with_sample_tasks("u"));
    let controller: Arc<DashController> = Arc::new(TaskController::new(gateway, Arc::clone(&toasts)));
    controller.load().await.unwrap();
    App::new(
        controller,
        toasts,
        Theme::plain(),
        PathBuf::from("/tmp/taskdeck-test"),
        tokio::runtime::Handle::current(),
    )
}
