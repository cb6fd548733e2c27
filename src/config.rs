use std::time::Duration;

use crate::console::DEFAULT_MAX_ENTRIES;

/// Default quiet period after the last edit before the preview reloads.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Tunables for one preview host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Edits closer together than this are coalesced into a single reload.
    pub debounce: Duration,
    /// Console entries kept before the oldest are evicted.
    pub max_log_entries: usize,
}

impl PreviewConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_max_log_entries(mut self, max: usize) -> Self {
        self.max_log_entries = max;
        self
    }

    /// Debounce in whole milliseconds, saturating at `u64::MAX`.
    pub fn debounce_ms(&self) -> u64 {
        u64::try_from(self.debounce.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_log_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
