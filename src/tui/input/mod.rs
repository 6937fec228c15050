mod form;
mod text;

pub use form::{FormField, FormOutcome, TaskForm};
pub use text::TextInput;

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent};

use crate::io::files;
use crate::notify::{NotificationSink, Severity};
use crate::ops::export::ExportFormat;
use crate::router::{Command, FocusContext, route};

use super::app::{App, Mode, PendingConfirm};

/// Top-level key handler: dispatches by mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    match app.mode {
        Mode::Navigate => {
            if let Some(command) = route(key, FocusContext::Other) {
                execute(app, command);
            }
        }
        Mode::Help => app.mode = Mode::Navigate,
        Mode::Search => handle_search(app, key),
        Mode::Form => handle_form(app, key),
        Mode::ImportPath => handle_import_path(app, key),
        Mode::Export => handle_export(app, key),
        Mode::Confirm => handle_confirm(app, key),
    }
}

/// Carry out a routed command in navigate mode
pub fn execute(app: &mut App, command: Command) {
    let ctl = &app.controller;
    match command {
        Command::ShowHelp => app.mode = Mode::Help,
        Command::FocusSearch => enter_search(app),
        Command::SelectAll => {
            ctl.select_all();
        }
        Command::DeselectAll => ctl.deselect_all(),
        Command::Export => app.mode = Mode::Export,
        Command::Import => {
            app.input.clear();
            app.mode = Mode::ImportPath;
        }
        Command::BulkComplete => app.spawn(|ctl| async move {
            ctl.bulk_complete().await;
        }),
        Command::BulkUncomplete => app.spawn(|ctl| async move {
            ctl.bulk_uncomplete().await;
        }),
        Command::BulkSetPriority(priority) => app.spawn(move |ctl| async move {
            ctl.bulk_set_priority(priority).await;
        }),
        Command::BulkDelete => match ctl.prepare_bulk_delete() {
            Some(confirmation) => {
                app.confirm = Some(PendingConfirm::DeleteMany(confirmation));
                app.mode = Mode::Confirm;
            }
            None => app.toasts.notify(Severity::Info, "No tasks selected"),
        },
        Command::NewTask => {
            app.form = Some(TaskForm::create());
            app.mode = Mode::Form;
        }
        Command::Edit => {
            if let Some(task) = ctl.resolve_target().and_then(|id| ctl.get(id)) {
                app.form = Some(TaskForm::edit(&task));
                app.mode = Mode::Form;
            }
        }
        Command::DeleteFocused => {
            if let Some(id) = ctl.resolve_target() {
                app.confirm = Some(PendingConfirm::DeleteOne(id));
                app.mode = Mode::Confirm;
            }
        }
        Command::ToggleComplete => {
            if let Some(id) = ctl.resolve_target() {
                app.spawn(move |ctl| async move {
                    let _ = ctl.toggle_complete(id).await;
                });
            }
        }
        Command::ToggleSelect => {
            let focused = ctl
                .focus()
                .and_then(|i| ctl.filtered_view().get(i).map(|t| t.id));
            if let Some(id) = focused {
                ctl.toggle_select(id);
            }
        }
        Command::NavigateUp => {
            ctl.navigate_up();
        }
        Command::NavigateDown => {
            ctl.navigate_down();
        }
        Command::CycleStatusFilter => ctl.update_filter(|f| f.status = f.status.next()),
        Command::CyclePriorityFilter => ctl.update_filter(|f| f.priority = f.priority.next()),
        Command::Reload => app.reload(),
        Command::Quit => app.should_quit = true,
    }
}

fn enter_search(app: &mut App) {
    let current = app.controller.filter().search;
    app.input.set(current);
    app.mode = Mode::Search;
}

fn handle_search(app: &mut App, key: KeyEvent) {
    if route(key, FocusContext::TextInput) == Some(Command::FocusSearch) {
        return;
    }
    match key.code {
        KeyCode::Enter => app.mode = Mode::Navigate,
        KeyCode::Esc => {
            app.input.clear();
            app.controller.update_filter(|f| f.search.clear());
            app.mode = Mode::Navigate;
        }
        _ => {
            if app.input.handle_key(key) {
                let search = app.input.text().to_string();
                app.controller.update_filter(|f| f.search = search);
            }
        }
    }
}

fn handle_form(app: &mut App, key: KeyEvent) {
    if route(key, FocusContext::TextInput) == Some(Command::FocusSearch) {
        app.form = None;
        enter_search(app);
        return;
    }
    let Some(form) = app.form.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };
    match key.code {
        KeyCode::Esc => {
            app.form = None;
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => {
            let outcome = form.submit();
            app.form = None;
            app.mode = Mode::Navigate;
            match outcome {
                FormOutcome::Create(draft) => app.spawn(|ctl| async move {
                    let _ = ctl.create(draft).await;
                }),
                FormOutcome::Update(id, patch) => app.spawn(move |ctl| async move {
                    let _ = ctl.update(id, patch).await;
                }),
                FormOutcome::Unchanged => {}
            }
        }
        _ => {
            form.handle_key(key);
        }
    }
}

fn handle_import_path(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Navigate,
        KeyCode::Enter => {
            app.mode = Mode::Navigate;
            let path = app.input.text().trim().to_string();
            if path.is_empty() {
                return;
            }
            match files::read_import(Path::new(&path)) {
                Ok((text, format)) => {
                    let _ = app.controller.import_document(&text, format);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "import failed");
                    app.toasts.notify(Severity::Error, err.to_string());
                }
            }
        }
        _ => {
            app.input.handle_key(key);
        }
    }
}

fn handle_export(app: &mut App, key: KeyEvent) {
    app.mode = Mode::Navigate;
    let format = match key.code {
        KeyCode::Char('j') => ExportFormat::Json,
        KeyCode::Char('c') => ExportFormat::Csv,
        _ => return,
    };
    let body = match format {
        ExportFormat::Json => app.controller.export_json(),
        ExportFormat::Csv => app.controller.export_csv(),
    };
    let today = chrono::Local::now().date_naive();
    let written = body
        .map_err(|e| e.to_string())
        .and_then(|body| files::write_export(&app.export_dir, format, today, &body).map_err(|e| e.to_string()));
    match written {
        Ok(path) => {
            let count = app.controller.stats().total;
            tracing::info!(path = %path.display(), count, "exported tasks");
            app.toasts.notify(
                Severity::Success,
                format!("Exported {} tasks to {}", count, path.display()),
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, "export failed");
            app.toasts.notify(Severity::Error, format!("Export failed: {err}"));
        }
    }
}

fn handle_confirm(app: &mut App, key: KeyEvent) {
    let accepted = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter);
    let pending = app.confirm.take();
    app.mode = Mode::Navigate;
    if !accepted {
        return;
    }
    match pending {
        Some(PendingConfirm::DeleteOne(id)) => app.spawn(move |ctl| async move {
            let _ = ctl.delete(id).await;
        }),
        Some(PendingConfirm::DeleteMany(confirmation)) => app.spawn(|ctl| async move {
            ctl.bulk_delete(confirmation).await;
        }),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, TaskGateway};
    use crate::model::filter::StatusFilter;
    use crate::model::task::Priority;
    use crate::notify::ToastQueue;
    use crate::tui::app::DashController;
    use crate::tui::theme::Theme;
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn app_with_samples(export_dir: &Path) -> App {
        app_with_gateway(export_dir, Arc::new(MemoryGateway::with_sample_tasks("u"))).await
    }

    async fn app_with_gateway(export_dir: &Path, memory: Arc<MemoryGateway>) -> App {
        let toasts = Arc::new(ToastQueue::new());
        let gateway: Arc<dyn TaskGateway> = memory;
        let controller: Arc<DashController> =
            Arc::new(crate::controller::TaskController::new(gateway, Arc::clone(&toasts)));
        controller.load().await.unwrap();
        App::new(
            controller,
            toasts,
            Theme::plain(),
            export_dir.to_path_buf(),
            tokio::runtime::Handle::current(),
        )
    }

    /// Let spawned controller operations finish
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_n_opens_form_and_enter_creates() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Form);
        // "n" typed into the title is text, not a new-task command
        type_str(&mut app, "new thing");
        assert_eq!(app.form.as_ref().unwrap().title.text(), "new thing");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Navigate);
        settle().await;
        assert_eq!(app.controller.tasks()[0].title, "new thing");
    }

    #[tokio::test]
    async fn test_navigate_and_toggle_focused() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.controller.focus(), Some(1));
        press(&mut app, KeyCode::Enter);
        settle().await;
        assert!(app.controller.get(2).unwrap().completed);
    }

    #[tokio::test]
    async fn test_search_mode_filters_live_and_esc_clears() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, Mode::Search);
        type_str(&mut app, "review");
        assert_eq!(app.controller.filtered_view().len(), 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.controller.filtered_view().len(), 3);
    }

    #[tokio::test]
    async fn test_bulk_delete_goes_through_confirm() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL));
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.mode, Mode::Confirm);
        assert_eq!(
            app.confirm.as_ref().unwrap().prompt(),
            "Delete 3 tasks? This cannot be undone."
        );
        press(&mut app, KeyCode::Char('n'));
        settle().await;
        assert_eq!(app.controller.tasks().len(), 3);

        press(&mut app, KeyCode::Char('D'));
        press(&mut app, KeyCode::Char('y'));
        settle().await;
        assert!(app.controller.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_filters_cycle() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.controller.filter().status, StatusFilter::Pending);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.controller.filtered_view().len(), 1);
        assert_eq!(app.controller.filtered_view()[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, Mode::Export);
        press(&mut app, KeyCode::Char('c'));
        let written: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
        let toast = app.toasts.all().pop().unwrap();
        assert_eq!(toast.severity, Severity::Success);
        assert!(toast.message.starts_with("Exported 3 tasks"));
    }

    #[tokio::test]
    async fn test_import_path_merges_locally() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("in.json");
        std::fs::write(&file, r#"[{"title": "from file"}]"#).unwrap();
        let memory = Arc::new(MemoryGateway::with_sample_tasks("u"));
        let mut app = app_with_gateway(tmp.path(), Arc::clone(&memory)).await;
        let calls = memory.calls();

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('i'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, Mode::ImportPath);
        type_str(&mut app, file.to_str().unwrap());
        press(&mut app, KeyCode::Enter);

        let tasks = app.controller.tasks();
        assert_eq!(tasks[0].title, "from file");
        assert_eq!(tasks[0].id, 4);
        assert_eq!(memory.calls(), calls);
    }

    #[tokio::test]
    async fn test_help_closes_on_any_key() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_with_samples(tmp.path()).await;
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, Mode::Navigate);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
