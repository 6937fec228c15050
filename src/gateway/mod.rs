//! Remote task gateway: the service that owns task records.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::filter::StatusFilter;
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};

pub use http::HttpGateway;
pub use memory::MemoryGateway;

/// Error type for gateway calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response
    #[error("{0}")]
    Transport(String),
    /// Non-2xx response; `message` is the server's `detail` or `HTTP {status}: {reason}`
    #[error("{message}")]
    Http { status: u16, message: String },
    /// The target record does not exist on the server
    #[error("{0}")]
    NotFound(String),
    /// A 2xx response whose body could not be decoded
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Body of a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReceipt {
    #[serde(default)]
    pub message: String,
    pub task_id: TaskId,
}

/// CRUD + completion toggle over the task service.
///
/// Every call is an independent round trip; implementations do not order or
/// serialize concurrent calls.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// User the gateway acts for
    fn owner(&self) -> &str;

    async fn list(&self, status: StatusFilter) -> Result<Vec<Task>, GatewayError>;

    async fn create(&self, draft: &TaskDraft) -> Result<Task, GatewayError>;

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, GatewayError>;

    /// Flip `completed` server-side and return the new record
    async fn toggle_complete(&self, id: TaskId) -> Result<Task, GatewayError>;

    async fn delete(&self, id: TaskId) -> Result<DeleteReceipt, GatewayError>;
}

#[async_trait]
impl<G: TaskGateway + ?Sized> TaskGateway for std::sync::Arc<G> {
    fn owner(&self) -> &str {
        (**self).owner()
    }

    async fn list(&self, status: StatusFilter) -> Result<Vec<Task>, GatewayError> {
        (**self).list(status).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, GatewayError> {
        (**self).create(draft).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, GatewayError> {
        (**self).update(id, patch).await
    }

    async fn toggle_complete(&self, id: TaskId) -> Result<Task, GatewayError> {
        (**self).toggle_complete(id).await
    }

    async fn delete(&self, id: TaskId) -> Result<DeleteReceipt, GatewayError> {
        (**self).delete(id).await
    }
}
