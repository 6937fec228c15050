//! Streaming chat assistant.
//!
//! The service answers a chat message with a server-sent event stream; each
//! `data:` line is a JSON object tagged by `type`. [`ChatTranscript`] folds
//! those events into the conversation as the user sees it.

mod client;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::GatewayError;

pub use client::{ChatClient, ChatStream};

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message is {0} characters; the limit is 2000")]
    MessageTooLong(usize),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("chat stream interrupted: {0}")]
    Stream(String),
    #[error("malformed chat event: {0}")]
    Decode(String),
}

/// Body of `POST /api/{user}/chat/stream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
}

impl ChatRequest {
    /// Trimmed, length-checked request
    pub fn new(message: &str, conversation_id: Option<i64>) -> Result<Self, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let len = message.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(ChatError::MessageTooLong(len));
        }
        Ok(ChatRequest {
            message: message.to_string(),
            conversation_id,
        })
    }
}

/// One decoded stream event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    ConversationId {
        conversation_id: i64,
    },
    Content {
        content: String,
    },
    ToolCall {
        tool: String,
        #[serde(default)]
        parameters: Value,
    },
    ToolResult {
        tool: String,
        #[serde(default)]
        result: Value,
    },
    Done {
        #[serde(default)]
        full_response: String,
    },
    Error {
        message: String,
    },
    /// Event types this client does not know about
    #[serde(other)]
    Unknown,
}

impl ChatEvent {
    /// Decode one `data:` payload; blank payloads carry nothing
    pub fn decode(data: &str) -> Result<Option<ChatEvent>, ChatError> {
        let data = data.trim();
        if data.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(data)
            .map(Some)
            .map_err(|e| ChatError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Tool invocation reported by the assistant
#[derive(Debug, Clone, PartialEq)]
pub struct ToolActivity {
    pub tool: String,
    pub parameters: Value,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub tools: Vec<ToolActivity>,
    /// Still receiving content
    pub streaming: bool,
    pub error: Option<String>,
}

impl ChatMessage {
    fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            text: text.into(),
            tools: Vec::new(),
            streaming: false,
            error: None,
        }
    }

    fn assistant() -> Self {
        ChatMessage {
            role: Role::Assistant,
            text: String::new(),
            tools: Vec::new(),
            streaming: true,
            error: None,
        }
    }
}

/// Conversation state built from stream events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTranscript {
    pub conversation_id: Option<i64>,
    pub messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's message and open an empty assistant reply
    pub fn begin(&mut self, message: &str) {
        self.messages.push(ChatMessage::user(message));
        self.messages.push(ChatMessage::assistant());
    }

    fn reply(&mut self) -> &mut ChatMessage {
        if !matches!(self.messages.last(), Some(m) if m.role == Role::Assistant) {
            self.messages.push(ChatMessage::assistant());
        }
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }

    pub fn apply(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::ConversationId { conversation_id } => {
                self.conversation_id = Some(*conversation_id);
            }
            ChatEvent::Content { content } => self.reply().text.push_str(content),
            ChatEvent::ToolCall { tool, parameters } => self.reply().tools.push(ToolActivity {
                tool: tool.clone(),
                parameters: parameters.clone(),
                result: None,
            }),
            ChatEvent::ToolResult { tool, result } => {
                let reply = self.reply();
                match reply
                    .tools
                    .iter_mut()
                    .rev()
                    .find(|t| &t.tool == tool && t.result.is_none())
                {
                    Some(call) => call.result = Some(result.clone()),
                    None => reply.tools.push(ToolActivity {
                        tool: tool.clone(),
                        parameters: Value::Null,
                        result: Some(result.clone()),
                    }),
                }
            }
            ChatEvent::Done { full_response } => {
                let reply = self.reply();
                if !full_response.is_empty() {
                    reply.text = full_response.clone();
                }
                reply.streaming = false;
            }
            ChatEvent::Error { message } => {
                let reply = self.reply();
                reply.error = Some(message.clone());
                reply.streaming = false;
            }
            ChatEvent::Unknown => {}
        }
    }

    /// The latest assistant reply, if any
    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}
