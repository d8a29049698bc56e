//! User-visible notifications (the storefront's toasts)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    /// Something worked
    Success,
    /// Something failed or was refused
    Error,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: Level,
    /// Human-readable text
    pub message: String,
}

impl Notification {
    /// Success message
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    /// Error message
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    /// Whether this is an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.level, Level::Error)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Notifications emitted by a feature, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications(Vec<Notification>);

impl Notifications {
    /// Record a success
    pub fn success(&mut self, message: impl Into<String>) {
        self.0.push(Notification::success(message));
    }

    /// Record an error
    pub fn error(&mut self, message: impl Into<String>) {
        self.0.push(Notification::error(message));
    }

    /// Most recent notification
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.0.last()
    }

    /// Most recent message text
    #[must_use]
    pub fn latest_message(&self) -> Option<&str> {
        self.latest().map(|n| n.message.as_str())
    }

    /// All notifications
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.0.iter()
    }

    /// Number of notifications
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.0)
    }
}
