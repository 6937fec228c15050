//! Notification sink: short-lived, user-visible status messages.
//!
//! The controller publishes through the [`NotificationSink`] trait it was
//! constructed with. The TUI reads a [`ToastQueue`]; the CLI uses [`LogSink`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

/// How a notification is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Auto-dismiss delay when the publisher does not pick one
    pub fn default_ttl(self) -> Duration {
        match self {
            Severity::Error => Duration::from_millis(5000),
            Severity::Warning => Duration::from_millis(4000),
            Severity::Success | Severity::Info => Duration::from_millis(3000),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Fire-and-forget publisher of status messages
pub trait NotificationSink: Send + Sync {
    fn publish(&self, severity: Severity, message: String, ttl: Duration);

    fn notify(&self, severity: Severity, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.publish(severity, message.into(), severity.default_ttl());
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn publish(&self, severity: Severity, message: String, ttl: Duration) {
        (**self).publish(severity, message, ttl);
    }
}

/// A queued notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    toasts: VecDeque<Toast>,
}

/// In-memory toast queue; expired entries are pruned when read
#[derive(Debug, Default)]
pub struct ToastQueue {
    state: Mutex<QueueState>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a toast that expires `ttl` after `now`; returns its id
    pub fn push_at(&self, severity: Severity, message: String, ttl: Duration, now: Instant) -> u64 {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.toasts.push_back(Toast {
            id,
            severity,
            message,
            expires_at: now + ttl,
        });
        id
    }

    /// Toasts still live at `now`, oldest first
    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        let mut state = self.lock();
        state.toasts.retain(|t| t.expires_at > now);
        state.toasts.iter().cloned().collect()
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    /// Every toast ever pushed and not yet pruned or dismissed
    pub fn all(&self) -> Vec<Toast> {
        self.lock().toasts.iter().cloned().collect()
    }

    pub fn dismiss(&self, id: u64) {
        self.lock().toasts.retain(|t| t.id != id);
    }

    pub fn clear(&self) {
        self.lock().toasts.clear();
    }
}

impl NotificationSink for ToastQueue {
    fn publish(&self, severity: Severity, message: String, ttl: Duration) {
        self.push_at(severity, message, ttl, Instant::now());
    }
}

/// Sink that routes notifications into the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, severity: Severity, message: String, _ttl: Duration) {
        match severity {
            Severity::Error => tracing::error!(target: "taskdeck::notify", "{message}"),
            Severity::Warning => tracing::warn!(target: "taskdeck::notify", "{message}"),
            Severity::Success | Severity::Info => {
                tracing::info!(target: "taskdeck::notify", %severity, "{message}")
            }
        }
    }
}
