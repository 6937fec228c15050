//! Task collection controller.
//!
//! Single owner of the client's task list, selection set, focus cursor and
//! filter. Every mutation goes through here, so derived views (filtered list,
//! stats) are always computed from a consistent state.
//!
//! Gateway-backed operations use confirm-then-apply: local state changes only
//! once the gateway has answered. State lives behind a mutex that is never
//! held across an `await`, so independent operations can be in flight at the
//! same time; a pending-operations set rejects a second request for an id
//! whose previous request has not settled.
//!
//! Imported tasks exist only on the client until the next load. They are
//! edited in place without a gateway call, and if the server later hands out
//! an id one of them holds, the imported task moves to a free id.

mod bulk;
mod pending;

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use indexmap::IndexMap;

use crate::gateway::{GatewayError, TaskGateway};
use crate::model::filter::{FilterState, Stats, StatusFilter};
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch, ValidationError};
use crate::notify::{NotificationSink, Severity};
use crate::ops::import::{ImportEntry, ImportFormat, ParseError, parse_import};
use crate::ops::{compute_filtered_view, compute_stats, export_csv, export_json};

pub use bulk::{BulkDeleteConfirmation, BulkKind, BulkReport};
use pending::PendingGuard;

/// Error type at the controller's operation boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Fetch(GatewayError),
    #[error("{detail}")]
    NotFound { id: TaskId, detail: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("task #{0} is still saving; try again in a moment")]
    Busy(TaskId),
    #[error("could not serialize tasks: {0}")]
    Serialize(String),
}

impl TaskError {
    fn from_gateway(err: GatewayError, id: TaskId) -> TaskError {
        match err {
            GatewayError::NotFound(detail) => TaskError::NotFound { id, detail },
            other => TaskError::Fetch(other),
        }
    }
}

/// Everything the controller owns
#[derive(Debug, Default)]
pub(crate) struct CollectionState {
    /// Most recently created first
    tasks: IndexMap<TaskId, Task>,
    selection: HashSet<TaskId>,
    /// Index into the filtered view
    focus: Option<usize>,
    filter: FilterState,
    pending: HashSet<TaskId>,
    /// Imported tasks the server has never seen
    local: HashSet<TaskId>,
    loading: bool,
}

impl CollectionState {
    fn filtered(&self) -> Vec<&Task> {
        compute_filtered_view(self.tasks.values(), &self.filter)
    }

    /// Keep the focus cursor inside the filtered view
    fn clamp_focus(&mut self) {
        let len = self.filtered().len();
        self.focus = match self.focus {
            Some(_) if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            other => other,
        };
    }

    /// Drop selected ids that no longer exist
    fn prune_selection(&mut self) {
        let tasks = &self.tasks;
        self.selection.retain(|id| tasks.contains_key(id));
    }

    /// Smallest id above every id in the collection
    fn next_id(&self) -> TaskId {
        self.tasks.keys().copied().max().unwrap_or(0).max(0) + 1
    }

    /// Replace a server record in place, keeping `updated_at` monotonic.
    /// A local-only task holding the same id is moved out of the way first.
    fn reconcile(&mut self, mut task: Task) {
        if self.local.contains(&task.id) {
            self.rekey_local(task.id);
        }
        let now = Utc::now();
        match self.tasks.get_mut(&task.id) {
            Some(existing) => {
                task.settle_timestamps(Some(existing), now);
                *existing = task;
            }
            None => {
                task.settle_timestamps(None, now);
                self.tasks.shift_insert(0, task.id, task);
            }
        }
    }

    /// Give a local-only task the next free id, keeping its position
    fn rekey_local(&mut self, id: TaskId) {
        let fresh = self.next_id();
        let Some((index, _, mut task)) = self.tasks.shift_remove_full(&id) else {
            return;
        };
        task.id = fresh;
        self.tasks.shift_insert(index, fresh, task);
        self.local.remove(&id);
        self.local.insert(fresh);
        if self.selection.remove(&id) {
            self.selection.insert(fresh);
        }
        tracing::debug!(from = id, to = fresh, "moved imported task to a free id");
    }

    /// Edit a local-only task in place; `None` for server records
    fn edit_local(&mut self, id: TaskId, f: impl FnOnce(&mut Task)) -> Option<Task> {
        if !self.local.contains(&id) {
            return None;
        }
        let task = self.tasks.get_mut(&id)?;
        f(task);
        task.updated_at = Utc::now().max(task.updated_at);
        Some(task.clone())
    }

    fn remove(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.tasks.shift_remove(&id);
        self.selection.remove(&id);
        self.local.remove(&id);
        self.clamp_focus();
        removed
    }

    fn focused_id(&self) -> Option<TaskId> {
        let i = self.focus?;
        self.filtered().get(i).map(|t| t.id)
    }
}

pub(crate) fn lock_state(state: &Mutex<CollectionState>) -> MutexGuard<'_, CollectionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Consistent copy of the controller state for rendering
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// The filtered view, in display order
    pub visible: Vec<Task>,
    pub stats: Stats,
    pub selection: HashSet<TaskId>,
    pub focus: Option<usize>,
    pub filter: FilterState,
    pub pending: HashSet<TaskId>,
    pub loading: bool,
}

/// The task collection controller
pub struct TaskController<G, N> {
    gateway: G,
    sink: N,
    state: Mutex<CollectionState>,
}

impl<G: TaskGateway, N: NotificationSink> TaskController<G, N> {
    pub fn new(gateway: G, sink: N) -> Self {
        TaskController {
            gateway,
            sink,
            state: Mutex::new(CollectionState::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState> {
        lock_state(&self.state)
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.sink
            .publish(severity, message.into(), severity.default_ttl());
    }

    /// Publish the error and hand it back for the caller's `?`
    fn fail<T>(&self, context: &str, err: TaskError) -> Result<T, TaskError> {
        tracing::warn!(error = %err, "{context}");
        let message = match &err {
            TaskError::Busy(_) => {
                self.notify(Severity::Warning, err.to_string());
                return Err(err);
            }
            TaskError::Validation(_) => err.to_string(),
            _ => format!("{context}: {err}"),
        };
        self.notify(Severity::Error, message);
        Err(err)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Replace the collection with the gateway's full task list.
    ///
    /// On failure the collection is emptied; nothing is retried or merged.
    pub async fn load(&self) -> Result<usize, TaskError> {
        self.lock().loading = true;
        tracing::debug!("loading tasks");
        let result = self.gateway.list(StatusFilter::All).await;

        let mut st = self.lock();
        st.loading = false;
        st.local.clear();
        match result {
            Ok(tasks) => {
                st.tasks = tasks.into_iter().map(|t| (t.id, t)).collect();
                st.prune_selection();
                st.clamp_focus();
                let count = st.tasks.len();
                drop(st);
                tracing::info!(count, "loaded tasks");
                Ok(count)
            }
            Err(err) => {
                st.tasks.clear();
                st.selection.clear();
                st.focus = None;
                drop(st);
                self.fail("Failed to load tasks", TaskError::Fetch(err))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Single-task mutations
    // -----------------------------------------------------------------------

    /// Validate locally, create remotely, then prepend the server's record
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TaskError> {
        let draft = match draft.validated() {
            Ok(d) => d,
            Err(e) => return self.fail("Could not create task", e.into()),
        };
        tracing::debug!(title = %draft.title, "creating task");
        match self.gateway.create(&draft).await {
            Ok(task) => {
                self.lock().reconcile(task.clone());
                tracing::info!(id = task.id, "task created");
                self.notify(Severity::Success, "Task created successfully!");
                Ok(task)
            }
            Err(err) => self.fail("Could not create task", TaskError::Fetch(err)),
        }
    }

    /// Apply a partial update to one task
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, TaskError> {
        let patch = match patch.validated() {
            Ok(p) => p,
            Err(e) => return self.fail("Could not update task", e.into()),
        };
        let local = self.lock().edit_local(id, |t| patch.apply_to(t));
        let task = match local {
            Some(task) => task,
            None => {
                self.mutate_one(id, "Could not update task", || self.gateway.update(id, &patch))
                    .await?
            }
        };
        self.notify(Severity::Success, "Task updated!");
        Ok(task)
    }

    /// Flip completion of one task
    pub async fn toggle_complete(&self, id: TaskId) -> Result<Task, TaskError> {
        let local = self.lock().edit_local(id, |t| t.completed = !t.completed);
        let task = match local {
            Some(task) => task,
            None => {
                self.mutate_one(id, "Could not update task", || self.gateway.toggle_complete(id))
                    .await?
            }
        };
        let message = if task.completed {
            "Task marked complete"
        } else {
            "Task marked pending"
        };
        self.notify(Severity::Success, message);
        Ok(task)
    }

    /// Delete one task; prunes it from the selection and clamps the focus cursor.
    ///
    /// A task the server reports as missing is pruned too, and the
    /// `NotFound` error is still returned.
    pub async fn delete(&self, id: TaskId) -> Result<(), TaskError> {
        let removed_locally = {
            let mut st = self.lock();
            st.local.contains(&id) && st.remove(id).is_some()
        };
        if removed_locally {
            tracing::info!(id, "local task deleted");
            self.notify(Severity::Success, "Task deleted!");
            return Ok(());
        }

        let (guard, busy) = PendingGuard::claim(&self.state, &[id]);
        if !busy.is_empty() {
            return self.fail("Could not delete task", TaskError::Busy(id));
        }
        tracing::debug!(id, "deleting task");
        let result = self.gateway.delete(id).await;
        match result {
            Ok(_) => {
                self.lock().remove(id);
                drop(guard);
                tracing::info!(id, "task deleted");
                self.notify(Severity::Success, "Task deleted!");
                Ok(())
            }
            Err(GatewayError::NotFound(detail)) => {
                self.lock().remove(id);
                drop(guard);
                tracing::warn!(id, %detail, "task already gone on the server");
                self.notify(Severity::Warning, format!("Task #{id} was already deleted"));
                Err(TaskError::NotFound { id, detail })
            }
            Err(err) => {
                drop(guard);
                self.fail("Could not delete task", TaskError::from_gateway(err, id))
            }
        }
    }

    /// Claim `id`, run the gateway call and reconcile its answer
    async fn mutate_one<F, Fut>(&self, id: TaskId, context: &str, call: F) -> Result<Task, TaskError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Task, GatewayError>>,
    {
        let (guard, busy) = PendingGuard::claim(&self.state, &[id]);
        if !busy.is_empty() {
            return self.fail(context, TaskError::Busy(id));
        }
        tracing::debug!(id, "mutating task");
        let result = call().await;
        match result {
            Ok(task) => {
                self.lock().reconcile(task.clone());
                drop(guard);
                tracing::info!(id, "task updated");
                Ok(task)
            }
            Err(err) => {
                drop(guard);
                self.fail(context, TaskError::from_gateway(err, id))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select every task in the current filtered view
    pub fn select_all(&self) -> usize {
        let count = {
            let mut st = self.lock();
            let ids: HashSet<TaskId> = st.filtered().iter().map(|t| t.id).collect();
            st.selection = ids;
            st.selection.len()
        };
        self.notify(Severity::Info, format!("Selected {count} tasks"));
        count
    }

    pub fn deselect_all(&self) {
        self.lock().selection.clear();
        self.notify(Severity::Info, "Deselected all tasks");
    }

    /// Toggle membership of `id`; returns whether it is now selected.
    /// Ids not in the collection are never selected.
    pub fn toggle_select(&self, id: TaskId) -> bool {
        let mut st = self.lock();
        if !st.tasks.contains_key(&id) {
            return false;
        }
        if st.selection.remove(&id) {
            false
        } else {
            st.selection.insert(id);
            true
        }
    }

    pub fn selection(&self) -> HashSet<TaskId> {
        self.lock().selection.clone()
    }

    // -----------------------------------------------------------------------
    // Filter and focus
    // -----------------------------------------------------------------------

    pub fn filter(&self) -> FilterState {
        self.lock().filter.clone()
    }

    /// Replace the filter; the focus cursor is clamped into the new view
    pub fn set_filter(&self, filter: FilterState) {
        let mut st = self.lock();
        st.filter = filter;
        st.clamp_focus();
    }

    /// Edit the filter in place
    pub fn update_filter(&self, f: impl FnOnce(&mut FilterState)) {
        let mut st = self.lock();
        f(&mut st.filter);
        st.clamp_focus();
    }

    pub fn focus(&self) -> Option<usize> {
        self.lock().focus
    }

    pub fn set_focus(&self, index: Option<usize>) {
        let mut st = self.lock();
        st.focus = index;
        st.clamp_focus();
    }

    /// Move the cursor down, wrapping from the last row to the first
    pub fn navigate_down(&self) -> Option<usize> {
        let mut st = self.lock();
        let len = st.filtered().len();
        if len == 0 {
            return st.focus;
        }
        st.focus = Some(match st.focus {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
        st.focus
    }

    /// Move the cursor up, wrapping from the first row to the last
    pub fn navigate_up(&self) -> Option<usize> {
        let mut st = self.lock();
        let len = st.filtered().len();
        if len == 0 {
            return st.focus;
        }
        st.focus = Some(match st.focus {
            Some(i) if i > 0 && i < len => i - 1,
            _ => len - 1,
        });
        st.focus
    }

    /// Task a keyboard command acts on: the focused row if valid, else the
    /// only selected task, else nothing
    pub fn resolve_target(&self) -> Option<TaskId> {
        let st = self.lock();
        if let Some(id) = st.focused_id() {
            return Some(id);
        }
        if st.selection.len() == 1 {
            return st.selection.iter().next().copied();
        }
        None
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    pub fn filtered_view(&self) -> Vec<Task> {
        self.lock().filtered().into_iter().cloned().collect()
    }

    pub fn stats(&self) -> Stats {
        compute_stats(self.lock().tasks.values())
    }

    /// Every task, in collection order
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.values().cloned().collect()
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.lock().tasks.get(&id).cloned()
    }

    /// Whether `id` is an imported task the server has never seen
    pub fn is_local(&self, id: TaskId) -> bool {
        self.lock().local.contains(&id)
    }

    pub fn snapshot(&self) -> Snapshot {
        let st = self.lock();
        Snapshot {
            visible: st.filtered().into_iter().cloned().collect(),
            stats: compute_stats(st.tasks.values()),
            selection: st.selection.clone(),
            focus: st.focus,
            filter: st.filter.clone(),
            pending: st.pending.clone(),
            loading: st.loading,
        }
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// Prepend imported entries with fresh local ids above the current maximum.
    ///
    /// Entries that fail title or description validation are dropped.
    /// Nothing is deduplicated.
    pub fn import_tasks(&self, entries: Vec<ImportEntry>) -> usize {
        let now = Utc::now();
        let owner = self.gateway.owner().to_string();
        let offered = entries.len();
        let valid: Vec<ImportEntry> = entries
            .into_iter()
            .filter_map(|entry| match entry.validated() {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping import entry");
                    None
                }
            })
            .collect();
        let count = valid.len();
        {
            let mut st = self.lock();
            let base = st.next_id();
            let imported: Vec<Task> = valid
                .into_iter()
                .zip(base..)
                .map(|(entry, id)| entry.into_task(id, &owner, now))
                .collect();
            st.local.extend(imported.iter().map(|t| t.id));
            let existing = std::mem::take(&mut st.tasks);
            st.tasks = imported
                .into_iter()
                .map(|t| (t.id, t))
                .chain(existing)
                .collect();
            st.clamp_focus();
        }
        tracing::info!(count, skipped = offered - count, "imported tasks");
        if count == 0 {
            self.notify(Severity::Info, "No tasks to import");
        } else {
            self.notify(Severity::Success, format!("Imported {count} tasks"));
        }
        count
    }

    /// Parse an import file and merge it; parse failures are published
    pub fn import_document(&self, text: &str, format: ImportFormat) -> Result<usize, TaskError> {
        match parse_import(text, format) {
            Ok(entries) => Ok(self.import_tasks(entries)),
            Err(err) => {
                let label = match format {
                    ImportFormat::Json => "Failed to import JSON",
                    ImportFormat::Csv => "Failed to import CSV",
                };
                self.fail(label, err.into())
            }
        }
    }

    /// Whole collection as pretty JSON (ignores the filter)
    pub fn export_json(&self) -> Result<String, TaskError> {
        export_json(self.lock().tasks.values()).map_err(|e| TaskError::Serialize(e.to_string()))
    }

    /// Whole collection as CSV (ignores the filter)
    pub fn export_csv(&self) -> Result<String, TaskError> {
        export_csv(self.lock().tasks.values()).map_err(|e| TaskError::Serialize(e.to_string()))
    }
}
