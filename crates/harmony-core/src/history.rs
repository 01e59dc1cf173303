//! Recent-imports history kept by the browser extension.
//!
//! Newest entries go first; after each insert the list is truncated from
//! the tail to [`MAX_HISTORY`] entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_HISTORY: usize = 10;

/// Characters of the selection kept in an entry's preview.
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Preview of the imported text.
    pub text: String,
    /// Page the text was captured from.
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub harmony_url: String,
}

impl HistoryEntry {
    pub fn new(selection: &str, url: &str, harmony_url: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: preview(selection),
            url: url.to_string(),
            timestamp,
            harmony_url: harmony_url.to_string(),
        }
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front and drop the oldest entries beyond the cap.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop();
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&HistoryEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Human-readable age of `timestamp` relative to `now`.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - timestamp).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let (n, unit) = if secs < 3600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3600, "hour")
    } else {
        (secs / 86_400, "day")
    };
    format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" })
}
