use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::config::ServerConfig;
use crate::model::filter::StatusFilter;
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};

use super::{DeleteReceipt, GatewayError, TaskGateway};

/// `GET /tasks` answers with either a bare array or a wrapper object
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskListBody {
    Bare(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

/// Gateway over the task service's REST API (`/api/{user_id}/tasks`)
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, user_id, token)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            user_id: user_id.into(),
            token,
        }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        Self::new(&server.api_url, &server.user_id, server.token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/{}/tasks", self.base_url, self.user_id)
    }

    fn task_url(&self, id: TaskId) -> String {
        format!("{}/{}", self.tasks_url(), id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        decode(response).await
    }
}

/// Turn a response into `T`, or into the service's error message
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    tracing::debug!(status = status.as_u16(), %message, "task service returned an error");
    if status == StatusCode::NOT_FOUND {
        Err(GatewayError::NotFound(message))
    } else {
        Err(GatewayError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

/// The body's `detail` string verbatim, else `HTTP {status}: {reason}`
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
        })
}

#[async_trait]
impl TaskGateway for HttpGateway {
    fn owner(&self) -> &str {
        &self.user_id
    }

    async fn list(&self, status: StatusFilter) -> Result<Vec<Task>, GatewayError> {
        let builder = self
            .request(Method::GET, self.tasks_url())
            .query(&[("status", status.as_str())]);
        let body: TaskListBody = self.send(builder).await?;
        Ok(match body {
            TaskListBody::Bare(tasks) | TaskListBody::Wrapped { tasks } => tasks,
        })
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, GatewayError> {
        let builder = self.request(Method::POST, self.tasks_url()).json(draft);
        self.send(builder).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, GatewayError> {
        let builder = self.request(Method::PUT, self.task_url(id)).json(patch);
        self.send(builder).await
    }

    async fn toggle_complete(&self, id: TaskId) -> Result<Task, GatewayError> {
        let url = format!("{}/complete", self.task_url(id));
        self.send(self.request(Method::PATCH, url)).await
    }

    async fn delete(&self, id: TaskId) -> Result<DeleteReceipt, GatewayError> {
        self.send(self.request(Method::DELETE, self.task_url(id))).await
    }
}
