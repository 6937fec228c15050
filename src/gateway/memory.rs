use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::model::filter::StatusFilter;
use crate::model::task::{Priority, Task, TaskDraft, TaskId, TaskPatch};

use super::{DeleteReceipt, GatewayError, TaskGateway};

#[derive(Debug, Default)]
struct Store {
    tasks: Vec<Task>,
    next_id: TaskId,
    /// Ids whose mutations fail with a 500
    failing: HashSet<TaskId>,
    fail_list: bool,
    calls: usize,
}

/// In-process task service. Backs `--demo` mode and the test suite.
///
/// Every call yields to the scheduler once before touching the store so that
/// concurrent callers genuinely interleave.
#[derive(Debug)]
pub struct MemoryGateway {
    owner: String,
    store: Mutex<Store>,
}

impl MemoryGateway {
    pub fn new(owner: impl Into<String>) -> Self {
        MemoryGateway {
            owner: owner.into(),
            store: Mutex::new(Store {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Gateway pre-loaded with `tasks` (newest first, as the service lists them)
    pub fn with_tasks(owner: impl Into<String>, tasks: Vec<Task>) -> Self {
        let gateway = MemoryGateway::new(owner);
        {
            let mut store = gateway.lock();
            store.next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            store.tasks = tasks;
        }
        gateway
    }

    /// Three sample tasks for demo mode
    pub fn with_sample_tasks(owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let day = |d: u32, h: u32| -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 12, d, h, 0, 0)
                .single()
                .unwrap_or_default()
        };
        let sample = |id, title: &str, description: &str, priority, completed, due, created| Task {
            description: Some(description.to_string()),
            priority,
            completed,
            due_at: Some(due),
            ..Task::new(id, owner.clone(), title, created)
        };
        let mut docs = sample(3, "Update documentation", "Update API docs", Priority::Low, true, day(10, 12), day(10, 9));
        docs.updated_at = day(13, 9);
        let tasks = vec![
            sample(1, "Complete project proposal", "Write and submit Q1 proposal", Priority::High, false, day(20, 17), day(13, 10)),
            sample(2, "Review pull requests", "Review pending PRs", Priority::Medium, false, day(15, 12), day(13, 9)),
            docs,
        ];
        MemoryGateway::with_tasks(owner, tasks)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every mutation of `id` fail with HTTP 500
    pub fn fail_on(&self, id: TaskId) {
        self.lock().failing.insert(id);
    }

    /// Make `list` fail with HTTP 503
    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Drop a record behind the client's back
    pub fn remove_silently(&self, id: TaskId) {
        self.lock().tasks.retain(|t| t.id != id);
    }

    /// Snapshot of the stored records
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Number of calls served so far
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn mutate<T>(
        &self,
        id: TaskId,
        f: impl FnOnce(&mut Vec<Task>, usize) -> T,
    ) -> Result<T, GatewayError> {
        let mut store = self.lock();
        store.calls += 1;
        if store.failing.contains(&id) {
            return Err(GatewayError::Http {
                status: 500,
                message: "HTTP 500: Internal Server Error".to_string(),
            });
        }
        let idx = store
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| GatewayError::NotFound("Task not found".to_string()))?;
        Ok(f(&mut store.tasks, idx))
    }
}

/// Server-side clock: strictly after the record's last update
fn touch(task: &mut Task) {
    task.updated_at = Utc::now().max(task.updated_at + Duration::milliseconds(1));
}

#[async_trait]
impl TaskGateway for MemoryGateway {
    fn owner(&self) -> &str {
        &self.owner
    }

    async fn list(&self, status: StatusFilter) -> Result<Vec<Task>, GatewayError> {
        tokio::task::yield_now().await;
        let mut store = self.lock();
        store.calls += 1;
        if store.fail_list {
            return Err(GatewayError::Http {
                status: 503,
                message: "HTTP 503: Service Unavailable".to_string(),
            });
        }
        Ok(store
            .tasks
            .iter()
            .filter(|t| status.matches(t))
            .cloned()
            .collect())
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, GatewayError> {
        tokio::task::yield_now().await;
        let mut store = self.lock();
        store.calls += 1;
        let id = store.next_id;
        store.next_id += 1;
        let task = Task {
            description: draft.description.clone(),
            priority: draft.priority.unwrap_or_default(),
            due_at: draft.due_at,
            ..Task::new(id, self.owner.clone(), draft.title.clone(), Utc::now())
        };
        store.tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, GatewayError> {
        tokio::task::yield_now().await;
        self.mutate(id, |tasks, idx| {
            let task = &mut tasks[idx];
            patch.apply_to(task);
            touch(task);
            task.clone()
        })
    }

    async fn toggle_complete(&self, id: TaskId) -> Result<Task, GatewayError> {
        tokio::task::yield_now().await;
        self.mutate(id, |tasks, idx| {
            let task = &mut tasks[idx];
            task.completed = !task.completed;
            touch(task);
            task.clone()
        })
    }

    async fn delete(&self, id: TaskId) -> Result<DeleteReceipt, GatewayError> {
        tokio::task::yield_now().await;
        self.mutate(id, |tasks, idx| {
            tasks.remove(idx);
            DeleteReceipt {
                message: "Task deleted successfully".to_string(),
                task_id: id,
            }
        })
    }
}
