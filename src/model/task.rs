use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Server-assigned task identifier
pub type TaskId = i64;

/// Maximum title length, in characters
pub const MAX_TITLE_CHARS: usize = 200;
/// Maximum description length, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Lenient parse used by importers: unknown or empty values fall back to medium
    pub fn parse_lenient(s: &str) -> Priority {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other:?}")),
        }
    }
}

/// A single to-do item as returned by the task service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Owning user; never changes after creation
    #[serde(rename = "user_id")]
    pub owner: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        rename = "due_date",
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a task stamped with `now` for both timestamps
    pub fn new(id: TaskId, owner: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Task {
            id,
            owner: owner.into(),
            title: title.into(),
            description: None,
            completed: false,
            priority: Priority::default(),
            due_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Description text, empty when absent
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Keep `updated_at` monotonic across a replacement of this record.
    ///
    /// `previous` is the copy being replaced, if any.
    pub fn settle_timestamps(&mut self, previous: Option<&Task>, now: DateTime<Utc>) {
        if let Some(prev) = previous
            && self.updated_at < prev.updated_at
        {
            self.updated_at = now.max(prev.updated_at);
        }
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
        }
    }
}

/// Client-side validation failures (never reach the gateway)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("title is {0} characters; the limit is 200")]
    TitleTooLong(usize),
    #[error("description is {0} characters; the limit is 1000")]
    DescriptionTooLong(usize),
}

/// Trim and check a title
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong(len));
    }
    Ok(trimmed.to_string())
}

/// Trim and check a description; blank descriptions become `None`
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(text) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let len = text.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong(len));
    }
    Ok(Some(text.to_string()))
}

/// Fields for a create request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        rename = "due_date",
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Return a normalized copy (trimmed title, blank description dropped)
    pub fn validated(&self) -> Result<TaskDraft, ValidationError> {
        Ok(TaskDraft {
            title: validate_title(&self.title)?,
            description: validate_description(self.description.as_deref())?,
            priority: self.priority,
            due_at: self.due_at,
        })
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        rename = "due_date",
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        TaskPatch {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        TaskPatch {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Return a normalized copy. An empty description string is kept as
    /// `Some("")` so that it clears the field on the server.
    pub fn validated(&self) -> Result<TaskPatch, ValidationError> {
        let title = self.title.as_deref().map(validate_title).transpose()?;
        let description = match self.description.as_deref() {
            Some(d) => Some(validate_description(Some(d))?.unwrap_or_default()),
            None => None,
        };
        Ok(TaskPatch {
            title,
            description,
            ..self.clone()
        })
    }

    /// Apply to a local record
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_at) = self.due_at {
            task.due_at = Some(due_at);
        }
    }
}
