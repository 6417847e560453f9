use std::time::{Duration, Instant, SystemTime};

/// Rate-limited modify-time watcher for one source file.
///
/// Polled at the start of every frame; the file is only stat'ed once per
/// `interval`. A changed timestamp (including the file appearing or
/// disappearing) reports `true` exactly once.
#[derive(Debug, Clone)]
pub struct HotReload {
    interval: Duration,
    last_check: Instant,
    last_modified: Option<SystemTime>,
}

impl HotReload {
    pub fn new(interval: Duration, now: Instant, modified: Option<SystemTime>) -> Self {
        Self {
            interval,
            last_check: now,
            last_modified: modified,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` when the interval has elapsed and the modify time changed.
    ///
    /// `modified` is only called when the interval has elapsed.
    pub fn poll(&mut self, now: Instant, modified: impl FnOnce() -> Option<SystemTime>) -> bool {
        if now.saturating_duration_since(self.last_check) < self.interval {
            return false;
        }
        self.last_check = now;

        let current = modified();
        if current == self.last_modified {
            return false;
        }
        self.last_modified = current;
        true
    }
}
