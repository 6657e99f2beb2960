//! FIFO play request queue.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

pub const UNKNOWN_FIELD: &str = "?";

#[derive(Debug, Error, PartialEq)]
pub enum QueueError {
    #[error("Invalid queue entry: {0}")]
    InvalidEntry(String),
    #[error("Unknown song {0}")]
    UnknownSong(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: String,
    pub title: String,
    pub artist: String,
}

impl QueueEntry {
    /// Builds an entry, defaulting a missing title or artist to "?".
    pub fn new(id: &str, title: Option<&str>, artist: Option<&str>) -> Result<Self, QueueError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(QueueError::InvalidEntry("empty id".to_string()));
        }
        let or_unknown = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(UNKNOWN_FIELD)
                .to_string()
        };
        Ok(Self {
            id: id.to_string(),
            title: or_unknown(title),
            artist: or_unknown(artist),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    entries: VecDeque<QueueEntry>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail. Entries with an empty id are refused.
    pub fn push(&mut self, entry: QueueEntry) -> Result<(), QueueError> {
        if entry.id.trim().is_empty() {
            return Err(QueueError::InvalidEntry("empty id".to_string()));
        }
        self.entries.push_back(entry);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upcoming entries, head first.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }
}
