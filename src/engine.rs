//! The queue engine.
//!
//! `QueueEngine` owns one deployment's [`QueueState`] and wraps every rule in
//! the freshness discipline:
//!
//! 1. Before acting, reload from the store if the cached copy is older than
//!    the freshness window.
//! 2. Apply the rule to the cached copy.
//! 3. If the state changed, save the full snapshot back.
//!
//! Persistence is best effort. Load failures keep the cached copy (defaults
//! on first use), save failures keep serving from memory. Neither reaches the
//! caller; both are logged and reflected in [`QueueEngine::persist_status`].
//! While the last save has failed the cached copy is ahead of the store, so
//! it is never replaced by a reload; the save is retried instead.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{ConfigError, Result};
use crate::state::{
    Clock, DailyResetReport, Entrant, GuestLocation, LeavePolicy, QueueState, ResetSchedule,
    SnapshotAge, SystemClock, DEFAULT_FRESHNESS_WINDOW,
};
use crate::store::StateStore;

/// Outcome of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistStatus {
    /// Nothing has been saved yet
    #[default]
    Idle,

    /// Last save reached the store
    Synced,

    /// Last save failed; the in-process copy is ahead of the store
    Degraded { reason: String },
}

impl PersistStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// An entrant as reported in a status view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestStatus {
    pub email: String,
    pub premium: bool,
    pub guest_location: GuestLocation,
}

/// Full status view of the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatus {
    pub is_open: bool,
    pub queue: Vec<GuestStatus>,
    pub premium_limit: u32,
    pub one_shot_price: f64,
    pub venue_mode_enabled: bool,
    pub venue_capacity: u32,
    pub guests_in_venue: u32,
    pub ready_pool_limit: u32,
    pub ready_pool: Vec<Entrant>,
    pub total_guests: usize,
    pub next_guest: Option<GuestStatus>,
}

impl QueueStatus {
    /// Build the view for a state.
    pub fn of(state: &QueueState) -> Self {
        let ready_count = state.ready_count();
        let queue: Vec<GuestStatus> = state
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entrant)| GuestStatus {
                email: entrant.email.clone(),
                premium: entrant.premium,
                guest_location: GuestLocation::at(index, ready_count),
            })
            .collect();

        Self {
            is_open: state.is_open,
            next_guest: queue.first().cloned(),
            total_guests: queue.len(),
            queue,
            premium_limit: state.premium_limit,
            one_shot_price: state.one_shot_price,
            venue_mode_enabled: state.venue_mode_enabled,
            venue_capacity: state.venue_capacity,
            guests_in_venue: state.guests_in_venue,
            ready_pool_limit: state.ready_pool_limit,
            ready_pool: state.ready_pool().to_vec(),
        }
    }

    /// Convert to JSON for sending to clients.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Queue engine for one deployment key.
pub struct QueueEngine {
    /// Deployment key
    app_id: String,

    /// Cached copy of the shared state
    state: QueueState,

    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    age: SnapshotAge,
    schedule: ResetSchedule,
    leave_policy: LeavePolicy,
    persist_status: PersistStatus,
}

impl std::fmt::Debug for QueueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEngine")
            .field("app_id", &self.app_id)
            .field("state", &self.state)
            .field("age", &self.age)
            .field("schedule", &self.schedule)
            .field("leave_policy", &self.leave_policy)
            .field("persist_status", &self.persist_status)
            .finish_non_exhaustive()
    }
}

impl QueueEngine {
    /// Create an engine with default settings.
    ///
    /// Nothing is loaded yet; the first operation pulls the stored snapshot or
    /// starts from defaults.
    pub fn new(app_id: impl Into<String>, store: Arc<dyn StateStore>) -> Self {
        Self {
            app_id: app_id.into(),
            state: QueueState::default(),
            store,
            clock: Arc::new(SystemClock),
            age: SnapshotAge::new(DEFAULT_FRESHNESS_WINDOW),
            schedule: ResetSchedule::default(),
            leave_policy: LeavePolicy::default(),
            persist_status: PersistStatus::default(),
        }
    }

    /// Create an engine and its store from configuration.
    pub fn from_config(config: &EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let store = config.open_store()?;
        Ok(Self::new(config.app_id.clone(), store)
            .with_freshness_window(config.freshness_window())
            .with_reset_schedule(config.reset_schedule())
            .with_leave_policy(config.leave_policy))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.age = SnapshotAge::new(window);
        self
    }

    #[must_use]
    pub fn with_reset_schedule(mut self, schedule: ResetSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_leave_policy(mut self, policy: LeavePolicy) -> Self {
        self.leave_policy = policy;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The cached state, as of the last operation.
    pub fn snapshot(&self) -> &QueueState {
        &self.state
    }

    pub fn persist_status(&self) -> &PersistStatus {
        &self.persist_status
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        self.leave_policy
    }

    // Freshness and persistence

    /// Reload from the store now, regardless of age.
    pub fn reload(&mut self) {
        self.age.invalidate();
        self.refresh();
    }

    fn refresh(&mut self) {
        let now = self.clock.now();
        if !self.age.is_stale(now) {
            return;
        }

        // Unsaved changes win over the stored snapshot.
        if self.persist_status.is_degraded() {
            self.persist();
            return;
        }

        match self.store.load(&self.app_id) {
            Ok(Some(state)) => {
                debug!(app_id = %self.app_id, entrants = state.len(), "Reloaded queue state");
                self.state = state;
                self.age.touch(now);
            }
            Ok(None) => {
                debug!(app_id = %self.app_id, "No stored queue state, keeping cached copy");
                self.age.touch(now);
            }
            Err(e) => {
                warn!(app_id = %self.app_id, error = %e, "Failed to load queue state, keeping cached copy");
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.app_id, &self.state) {
            Ok(()) => {
                debug!(app_id = %self.app_id, entrants = self.state.len(), "Saved queue state");
                self.age.touch(self.clock.now());
                self.persist_status = PersistStatus::Synced;
            }
            Err(e) => {
                warn!(app_id = %self.app_id, error = %e, "Failed to save queue state, continuing from memory");
                self.persist_status = PersistStatus::Degraded {
                    reason: e.to_string(),
                };
            }
        }
    }

    /// Refresh, apply a rule, and save if the state changed.
    ///
    /// Rejected rules leave the state untouched, so a `Result` passes through
    /// without triggering a save.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut QueueState) -> T) -> T {
        self.refresh();
        let before = self.state.clone();
        let value = op(&mut self.state);
        if self.state != before {
            self.persist();
        }
        value
    }

    fn read<T>(&mut self, op: impl FnOnce(&QueueState) -> T) -> T {
        self.refresh();
        op(&self.state)
    }

    // System status

    /// Full status view. Runs the automatic daily reset first if it is due.
    pub fn status(&mut self) -> QueueStatus {
        self.run_scheduled_reset();
        QueueStatus::of(&self.state)
    }

    /// Run the automatic daily reset if the reset window is open and it has
    /// not run today.
    pub fn run_scheduled_reset(&mut self) -> Option<DailyResetReport> {
        self.refresh();
        let now = self.clock.now();
        if !self.schedule.is_due(now, self.state.last_reset_date) {
            return None;
        }

        let guests_cleared = self.state.clear_for_new_day();
        self.state.last_reset_date = Some(now.date_naive());
        self.persist();

        info!(app_id = %self.app_id, guests_cleared, "Automatic daily reset");
        Some(DailyResetReport::new(guests_cleared, now))
    }

    /// Clear the line and venue occupancy, keeping configuration.
    pub fn daily_reset(&mut self) -> DailyResetReport {
        let now = self.clock.now();
        let guests_cleared = self.mutate(QueueState::clear_for_new_day);

        info!(app_id = %self.app_id, guests_cleared, "Daily reset");
        DailyResetReport::new(guests_cleared, now)
    }

    // Joining and leaving

    /// Join at the back of the line, returning the position.
    pub fn join(&mut self, email: &str) -> Result<usize> {
        self.mutate(|state| {
            if state.join(email)? {
                debug!(email, "Guest joined");
            }
            state.position(email)
        })
    }

    /// Join (or upgrade into) the premium lane, returning the position.
    pub fn join_premium(&mut self, email: &str) -> Result<usize> {
        let position = self.mutate(|state| state.join_premium(email))?;
        info!(email, position, "Premium guest joined");
        Ok(position)
    }

    pub fn position(&mut self, email: &str) -> Result<usize> {
        self.read(|state| state.position(email))
    }

    pub fn is_premium(&mut self, email: &str) -> Result<bool> {
        self.read(|state| state.is_premium(email))
    }

    /// Remove the front entrant. `Ok(None)` on an empty line.
    pub fn advance(&mut self) -> Result<Option<Entrant>> {
        let admitted = self.mutate(QueueState::advance)?;
        if let Some(entrant) = &admitted {
            info!(email = %entrant.email, guests_in_venue = self.state.guests_in_venue, "Queue advanced");
        }
        Ok(admitted)
    }

    /// Remove an email from the line. `Ok(None)` if it was not in line.
    pub fn leave(&mut self, email: &str) -> Result<Option<Entrant>> {
        let policy = self.leave_policy;
        let removed = self.mutate(|state| state.leave(email, policy))?;
        if removed.is_some() {
            debug!(email, ?policy, "Guest left");
        }
        Ok(removed)
    }

    /// Admit a specific guest from the ready threshold.
    pub fn scan(&mut self, email: &str) -> Result<Entrant> {
        let admitted = self.mutate(|state| state.scan(email))?;
        info!(email, guests_in_venue = self.state.guests_in_venue, "Guest scanned in");
        Ok(admitted)
    }

    // Basic queue settings

    pub fn open(&mut self) {
        self.mutate(QueueState::open);
    }

    pub fn close(&mut self) {
        self.mutate(QueueState::close);
    }

    /// Drop every entrant, returning how many were cleared.
    pub fn clear(&mut self) -> usize {
        self.mutate(QueueState::clear)
    }

    /// Add synthetic guests, returning how many were added.
    pub fn seed_mock_guests(&mut self, count: usize) -> Result<usize> {
        self.mutate(|state| state.seed_mock_guests(count))
    }

    pub fn reset_mock_counter(&mut self) {
        self.mutate(QueueState::reset_mock_counter);
    }

    // Configuration

    pub fn set_premium_limit(&mut self, limit: i64) -> Result<()> {
        self.mutate(|state| state.set_premium_limit(limit))?;
        info!(limit, "Premium limit updated");
        Ok(())
    }

    pub fn set_one_shot_price(&mut self, price: f64) -> Result<()> {
        self.mutate(|state| state.set_one_shot_price(price))?;
        info!(price, "One shot price updated");
        Ok(())
    }

    pub fn set_ready_pool_limit(&mut self, limit: i64) -> Result<()> {
        self.mutate(|state| state.set_ready_pool_limit(limit))?;
        info!(limit, "Ready pool limit updated");
        Ok(())
    }

    pub fn set_venue_capacity(&mut self, capacity: i64) -> Result<()> {
        self.mutate(|state| state.set_venue_capacity(capacity))?;
        info!(capacity, "Venue capacity updated");
        Ok(())
    }

    pub fn set_venue_mode(&mut self, enabled: bool) {
        self.mutate(|state| state.set_venue_mode(enabled));
        info!(enabled, "Venue mode updated");
    }

    // Venue occupancy

    pub fn increment_guests_in_venue(&mut self) -> Result<()> {
        self.mutate(QueueState::increment_guests_in_venue)
    }

    pub fn decrement_guests_in_venue(&mut self) -> Result<()> {
        self.mutate(QueueState::decrement_guests_in_venue)
    }
}
