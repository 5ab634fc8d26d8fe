//! Snapshot freshness tracking.
//!
//! Each engine instance keeps a cached copy of the queue state. The copy is
//! trusted for a short window after it was loaded or saved; past that window
//! the engine reloads from the store before acting.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Default maximum age of a cached snapshot (2 seconds).
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(2);

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    /// Jump to a specific instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Age tracking for the cached snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotAge {
    /// When the cached copy last matched the store
    synced_at: Option<DateTime<Utc>>,

    /// How long the cached copy is trusted
    window: Duration,
}

impl SnapshotAge {
    /// A tracker that starts stale, forcing a load on first use.
    pub fn new(window: Duration) -> Self {
        Self {
            synced_at: None,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record that the cache matches the store as of `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.synced_at = Some(now);
    }

    /// Force the next check to report stale.
    pub fn invalidate(&mut self) {
        self.synced_at = None;
    }

    /// Get time since the last sync. `None` if never synced or the clock ran backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.synced_at.and_then(|at| (now - at).to_std().ok())
    }

    /// Check if the cached copy is older than the window.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now).map_or(true, |age| age > self.window)
    }
}

impl Default for SnapshotAge {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}
