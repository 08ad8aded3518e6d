//! Bounded queue of player-facing notifications.
//!
//! The queue keeps at most `capacity` entries; pushing into a full queue
//! drops the oldest. Every push is mirrored to `tracing` at the level
//! matching its severity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of notifications kept.
pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationQueue {
    entries: VecDeque<Notification>,
    capacity: usize,
}

impl NotificationQueue {
    /// A queue holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        let note = Notification::new(message, severity);
        match severity {
            Severity::Info | Severity::Success => {
                tracing::info!(message = %note.message, ?severity, "notification")
            }
            Severity::Warning => tracing::warn!(message = %note.message, "notification"),
            Severity::Error => tracing::error!(message = %note.message, "notification"),
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(note);
    }

    /// Remove the entry at `index` (oldest is 0). Out-of-range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Notification> {
        self.entries.remove(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
