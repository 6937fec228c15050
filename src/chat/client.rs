use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};

use crate::gateway::http::error_message;
use crate::gateway::GatewayError;
use crate::model::config::ServerConfig;

use super::{ChatError, ChatEvent, ChatRequest};

/// Decoded chat events, in arrival order
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send>>;

/// Client for the assistant's streaming endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    token: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>, token: Option<String>) -> Self {
        ChatClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            token,
        }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        Self::new(&server.api_url, &server.user_id, server.token.clone())
    }

    fn stream_url(&self) -> String {
        format!("{}/api/{}/chat/stream", self.base_url, self.user_id)
    }

    /// Send `request` and return the reply as an event stream.
    ///
    /// HTTP errors surface before any event is produced.
    pub async fn stream(&self, request: &ChatRequest) -> Result<ChatStream, ChatError> {
        tracing::debug!(conversation = ?request.conversation_id, "sending chat message");
        let mut builder = self
            .http
            .post(self.stream_url())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            return Err(ChatError::Gateway(GatewayError::Http {
                status: status.as_u16(),
                message,
            }));
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .filter_map(|item| async move {
                match item {
                    Ok(event) => ChatEvent::decode(&event.data).transpose(),
                    Err(e) => Some(Err(ChatError::Stream(e.to_string()))),
                }
            });
        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url() {
        let client = ChatClient::new("http://localhost:8000/", "u1", None);
        assert_eq!(client.stream_url(), "http://localhost:8000/api/u1/chat/stream");
    }
}
