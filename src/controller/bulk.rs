use std::fmt;

use crate::gateway::{GatewayError, TaskGateway};
use crate::model::task::{Priority, Task, TaskId, TaskPatch};
use crate::notify::{NotificationSink, Severity};

use super::pending::PendingGuard;
use super::{TaskController, TaskError, lock_state};

/// Which mutation a bulk call applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Complete,
    Uncomplete,
    Delete,
    SetPriority(Priority),
}

impl BulkKind {
    /// Whether `task` already has the target state
    fn satisfied_by(self, task: &Task) -> bool {
        match self {
            BulkKind::Complete => task.completed,
            BulkKind::Uncomplete => !task.completed,
            BulkKind::SetPriority(p) => task.priority == p,
            BulkKind::Delete => false,
        }
    }

    fn patch(self) -> Option<TaskPatch> {
        match self {
            BulkKind::Complete => Some(TaskPatch::completed(true)),
            BulkKind::Uncomplete => Some(TaskPatch::completed(false)),
            BulkKind::SetPriority(p) => Some(TaskPatch::priority(p)),
            BulkKind::Delete => None,
        }
    }

    fn done_phrase(self) -> String {
        match self {
            BulkKind::Complete => "marked complete".to_string(),
            BulkKind::Uncomplete => "marked pending".to_string(),
            BulkKind::Delete => "deleted".to_string(),
            BulkKind::SetPriority(p) => format!("set to {p} priority"),
        }
    }
}

impl fmt::Display for BulkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkKind::Complete => f.write_str("complete"),
            BulkKind::Uncomplete => f.write_str("uncomplete"),
            BulkKind::Delete => f.write_str("delete"),
            BulkKind::SetPriority(p) => write!(f, "priority {p}"),
        }
    }
}

/// Outcome of a bulk operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub kind: BulkKind,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: Vec<(TaskId, TaskError)>,
}

impl BulkReport {
    fn empty(kind: BulkKind) -> Self {
        BulkReport {
            kind,
            requested: 0,
            succeeded: 0,
            failed: Vec::new(),
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn severity(&self) -> Severity {
        match (self.succeeded, self.failed.len()) {
            (_, 0) => Severity::Success,
            (0, _) => Severity::Error,
            _ => Severity::Warning,
        }
    }

    fn summary(&self) -> String {
        let phrase = self.kind.done_phrase();
        if self.failed.is_empty() {
            format!("{} tasks {phrase}", self.succeeded)
        } else if self.succeeded == 0 {
            format!("Failed to {} {} tasks", self.kind, self.failed.len())
        } else {
            format!(
                "{} of {} tasks {phrase}; {} failed",
                self.succeeded,
                self.requested,
                self.failed.len()
            )
        }
    }
}

/// Proof that the user confirmed a bulk delete.
///
/// Only [`TaskController::prepare_bulk_delete`] can mint one, and only for a
/// non-empty selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteConfirmation {
    ids: Vec<TaskId>,
}

impl BulkDeleteConfirmation {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Text shown to the user before confirming
    pub fn prompt(&self) -> String {
        format!("Delete {} tasks? This cannot be undone.", self.ids.len())
    }
}

/// Result of one item inside a bulk pass
enum Settled {
    Updated(Task),
    Deleted(TaskId),
    Unchanged,
    /// Local-only task, already edited in place
    Local,
}

impl<G: TaskGateway, N: NotificationSink> TaskController<G, N> {
    pub async fn bulk_complete(&self) -> BulkReport {
        let ids = self.selected_ids();
        self.run_bulk(BulkKind::Complete, ids).await
    }

    pub async fn bulk_uncomplete(&self) -> BulkReport {
        let ids = self.selected_ids();
        self.run_bulk(BulkKind::Uncomplete, ids).await
    }

    pub async fn bulk_set_priority(&self, priority: Priority) -> BulkReport {
        let ids = self.selected_ids();
        self.run_bulk(BulkKind::SetPriority(priority), ids).await
    }

    /// Confirmation token for deleting the current selection, or `None` when
    /// nothing is selected
    pub fn prepare_bulk_delete(&self) -> Option<BulkDeleteConfirmation> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return None;
        }
        Some(BulkDeleteConfirmation { ids })
    }

    /// Delete the tasks the confirmation was minted for
    pub async fn bulk_delete(&self, confirmation: BulkDeleteConfirmation) -> BulkReport {
        self.run_bulk(BulkKind::Delete, confirmation.ids).await
    }

    /// Selected ids in collection order
    fn selected_ids(&self) -> Vec<TaskId> {
        let st = lock_state(&self.state);
        st.tasks
            .keys()
            .filter(|id| st.selection.contains(id))
            .copied()
            .collect()
    }

    /// Sequential per-item calls; continue past failures, apply every success
    /// in one pass at the end, then clear the selection.
    async fn run_bulk(&self, kind: BulkKind, ids: Vec<TaskId>) -> BulkReport {
        if ids.is_empty() {
            self.notify(Severity::Info, "No tasks selected");
            return BulkReport::empty(kind);
        }
        tracing::debug!(%kind, count = ids.len(), "starting bulk operation");

        let mut report = BulkReport {
            kind,
            requested: ids.len(),
            succeeded: 0,
            failed: Vec::new(),
        };
        let (guard, busy) = PendingGuard::claim(&self.state, &ids);
        for id in busy {
            report.failed.push((id, TaskError::Busy(id)));
        }

        let mut settled = Vec::with_capacity(guard.ids().len());
        let mut remote = Vec::with_capacity(guard.ids().len());
        {
            let mut st = lock_state(&self.state);
            for &id in guard.ids() {
                let applied = match kind.patch() {
                    Some(patch) => st.edit_local(id, |t| patch.apply_to(t)).is_some(),
                    None => st.local.contains(&id) && st.remove(id).is_some(),
                };
                if applied {
                    settled.push(Settled::Local);
                } else {
                    remote.push(id);
                }
            }
        }

        for id in remote {
            let current = lock_state(&self.state).tasks.get(&id).cloned();
            let outcome = match current {
                None => Err(TaskError::NotFound {
                    id,
                    detail: "Task not found".to_string(),
                }),
                Some(task) if kind.satisfied_by(&task) => Ok(Settled::Unchanged),
                Some(_) => self.bulk_call(kind, id).await,
            };
            match outcome {
                Ok(s) => settled.push(s),
                Err(err) => {
                    tracing::warn!(id, %kind, error = %err, "bulk item failed");
                    report.failed.push((id, err));
                }
            }
        }
        report.succeeded = settled.len();

        {
            let mut st = lock_state(&self.state);
            // Deletes the server answered with 404 still leave the collection
            if kind == BulkKind::Delete {
                for (id, err) in &report.failed {
                    if matches!(err, TaskError::NotFound { .. }) {
                        st.remove(*id);
                    }
                }
            }
            for s in settled {
                match s {
                    Settled::Updated(task) => st.reconcile(task),
                    Settled::Deleted(id) => {
                        st.remove(id);
                    }
                    Settled::Unchanged | Settled::Local => {}
                }
            }
            st.selection.clear();
            st.clamp_focus();
        }
        drop(guard);

        tracing::info!(
            %kind,
            requested = report.requested,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "bulk operation finished"
        );
        self.notify(report.severity(), report.summary());
        report
    }

    async fn bulk_call(&self, kind: BulkKind, id: TaskId) -> Result<Settled, TaskError> {
        let result: Result<Settled, GatewayError> = match kind.patch() {
            Some(patch) => self.gateway.update(id, &patch).await.map(Settled::Updated),
            None => self.gateway.delete(id).await.map(|_| Settled::Deleted(id)),
        };
        result.map_err(|e| TaskError::from_gateway(e, id))
    }
}
