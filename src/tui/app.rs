use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Handle;

use crate::controller::{BulkDeleteConfirmation, TaskController};
use crate::gateway::TaskGateway;
use crate::model::config::ClientConfig;
use crate::model::task::TaskId;
use crate::notify::ToastQueue;

use super::input::{self, TaskForm, TextInput};
use super::render;
use super::theme::Theme;

pub type DashController = TaskController<Arc<dyn TaskGateway>, Arc<ToastQueue>>;

/// Current interaction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the search box; the filter updates live
    Search,
    /// Create (`editing == None`) or edit form
    Form,
    /// Waiting for export format (j/c)
    Export,
    /// Typing an import file path
    ImportPath,
    /// Waiting for y/n on a destructive action
    Confirm,
    Help,
}

/// Destructive action awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    DeleteOne(TaskId),
    DeleteMany(BulkDeleteConfirmation),
}

impl PendingConfirm {
    pub fn prompt(&self) -> String {
        match self {
            PendingConfirm::DeleteOne(id) => format!("Delete task #{id}? This cannot be undone."),
            PendingConfirm::DeleteMany(c) => c.prompt(),
        }
    }
}

/// Main application state
pub struct App {
    pub controller: Arc<DashController>,
    pub toasts: Arc<ToastQueue>,
    pub theme: Theme,
    pub mode: Mode,
    /// Search box / import path buffer
    pub input: TextInput,
    pub form: Option<TaskForm>,
    pub confirm: Option<PendingConfirm>,
    pub export_dir: PathBuf,
    pub should_quit: bool,
    runtime: Handle,
}

impl App {
    pub fn new(
        controller: Arc<DashController>,
        toasts: Arc<ToastQueue>,
        theme: Theme,
        export_dir: PathBuf,
        runtime: Handle,
    ) -> Self {
        App {
            controller,
            toasts,
            theme,
            mode: Mode::Navigate,
            input: TextInput::default(),
            form: None,
            confirm: None,
            export_dir,
            should_quit: false,
            runtime,
        }
    }

    /// Run a controller operation on the runtime without blocking the UI.
    /// Outcomes reach the user through the toast queue.
    pub fn spawn<F, Fut>(&self, op: F)
    where
        F: FnOnce(Arc<DashController>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(op(Arc::clone(&self.controller)));
    }

    pub fn reload(&self) {
        self.spawn(|ctl| async move {
            let _ = ctl.load().await;
        });
    }
}

/// Launch the dashboard
pub fn run(config: &ClientConfig, gateway: Arc<dyn TaskGateway>, runtime: Handle) -> anyhow::Result<()> {
    let toasts = Arc::new(ToastQueue::new());
    let controller = Arc::new(TaskController::new(gateway, Arc::clone(&toasts)));
    let mut app = App::new(
        controller,
        toasts,
        Theme::from_config(&config.ui),
        PathBuf::from(&config.ui.export_dir),
        runtime,
    );
    app.reload();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("dashboard closed");
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    loop {
        let snapshot = app.controller.snapshot();
        terminal.draw(|frame| render::render(frame, app, &snapshot))?;

        // Short poll so results of background operations show up promptly
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
