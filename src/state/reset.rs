//! Daily reset window.
//!
//! The automatic reset fires at most once per calendar day (UTC), the first
//! time the engine is polled inside the configured hour.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Default reset hour (04:00-04:59 UTC).
pub const DEFAULT_RESET_HOUR_UTC: u32 = 4;

/// When the automatic reset may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    hour: u32,
}

impl ResetSchedule {
    /// Schedule for the given UTC hour. Returns `None` for hours outside 0-23.
    pub fn at_hour(hour: u32) -> Option<Self> {
        (hour < 24).then_some(Self { hour })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Check if `now` falls in the reset hour.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        now.hour() == self.hour
    }

    /// Check if an automatic reset should run now, given the last reset date.
    pub fn is_due(&self, now: DateTime<Utc>, last_reset: Option<NaiveDate>) -> bool {
        self.in_window(now) && last_reset != Some(now.date_naive())
    }
}

impl Default for ResetSchedule {
    fn default() -> Self {
        Self {
            hour: DEFAULT_RESET_HOUR_UTC,
        }
    }
}

/// Outcome of a daily reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyResetReport {
    pub message: String,
    pub guests_cleared: usize,
    pub reset_at: DateTime<Utc>,
}

impl DailyResetReport {
    pub fn new(guests_cleared: usize, reset_at: DateTime<Utc>) -> Self {
        Self {
            message: format!("Daily reset completed, {guests_cleared} guests cleared"),
            guests_cleared,
            reset_at,
        }
    }
}
