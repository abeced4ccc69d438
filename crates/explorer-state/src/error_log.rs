//! Dismissible list of errors surfaced to the user.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub id: u64,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Errors in the order they happened. Ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<ErrorEntry>,
    next_id: u64,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and return its id.
    pub fn push(&mut self, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(ErrorEntry {
            id,
            message: message.into(),
            at: Utc::now(),
        });
        id
    }

    /// Remove one entry; false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
