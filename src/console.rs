//! The host-side console feed built from sandbox messages.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::protocol::{BridgeMessage, LogLevel};

/// Appended whenever a reload cycle begins, separating the output of the old
/// and the new sandbox generation.
pub const RELOAD_MARKER: &str = "--- Reloading Preview ---";

pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// One line in the console panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// What a call to [`LogFeed::receive`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub appended: Option<LogEntry>,
    /// The panel went from hidden to visible.
    pub revealed: bool,
}

/// Ordered, append-only console feed plus the panel visibility flag.
#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
    panel_visible: bool,
}

impl LogFeed {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
            panel_visible: false,
        }
    }

    /// Apply one bridge message. Errors force the panel open; other levels
    /// leave visibility alone.
    pub fn receive(&mut self, message: BridgeMessage) -> Receipt {
        match message {
            BridgeMessage::ConsoleMessage { level, args } => {
                let entry = self.push(LogEntry::new(level, args.join(" ")));
                let revealed = level == LogLevel::Error && !self.panel_visible;
                if level == LogLevel::Error {
                    self.panel_visible = true;
                }
                Receipt {
                    appended: Some(entry),
                    revealed,
                }
            }
            BridgeMessage::Unknown => Receipt::default(),
        }
    }

    pub fn push_marker(&mut self) -> LogEntry {
        self.push(LogEntry::new(LogLevel::Log, RELOAD_MARKER))
    }

    fn push(&mut self, entry: LogEntry) -> LogEntry {
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.clone());
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Flip panel visibility and return the new state.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_visible = !self.panel_visible;
        self.panel_visible
    }

    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
