// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded activity log shown to the operator and exportable as text.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::info;

use ticketwerk_core::error::Result;
use ticketwerk_core::types::LogCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub category: LogCategory,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.at.format("%H:%M:%S"),
            self.category,
            self.message
        )
    }
}

/// Keeps the newest `capacity` entries; older ones fall off the front.
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    /// Entries pushed since the last clear, including evicted ones.
    total: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    pub fn push(&mut self, category: LogCategory, message: impl Into<String>) -> &LogEntry {
        self.push_entry(LogEntry {
            at: Local::now(),
            category,
            message: message.into(),
        })
    }

    fn push_entry(&mut self, entry: LogEntry) -> &LogEntry {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.total += 1;
        self.entries.push_back(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// All retained entries, one `[time] CATEGORY: message` line each.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write `render()` to `path`.  Returns the number of lines written.
    pub fn export(&self, path: &Path) -> Result<usize> {
        std::fs::write(path, self.render())?;
        info!(path = %path.display(), lines = self.len(), "activity log exported");
        Ok(self.len())
    }
}
