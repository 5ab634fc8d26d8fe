//! Queue state and the ordering/admission rules.
//!
//! `QueueState` is the unit of persistence. Every rule here is pure: the
//! methods validate first and only then touch the entry list, so a rejected
//! call leaves the state exactly as it was. Persistence and freshness live in
//! [`crate::engine`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::entrant::{Entrant, EntrantEvent, EntrantLifecycle};
use crate::error::{QueueError, Result};

/// Default cap on premium entrants waiting behind the front of the line.
pub const DEFAULT_PREMIUM_LIMIT: u32 = 3;

/// Default informational price of a premium slot.
pub const DEFAULT_ONE_SHOT_PRICE: f64 = 5.0;

/// Domain used for synthetic guests.
pub const MOCK_GUEST_DOMAIN: &str = "example.com";

/// Most synthetic guests a single seeding call may add.
pub const MAX_MOCK_GUESTS: usize = 1000;

/// What a voluntary leave means for venue occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePolicy {
    /// Leaving the line does not touch the venue
    #[default]
    Release,

    /// Leaving counts as entering the venue (capacity-checked)
    Admit,
}

/// Full queue state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueState {
    /// Entrants in line order, index 0 is the front
    #[serde(rename = "queue")]
    entries: Vec<Entrant>,

    /// Whether new joins are accepted
    pub is_open: bool,

    /// Max premium entrants at positions >= 1
    pub premium_limit: u32,

    /// Informational premium price, never enforced
    pub one_shot_price: f64,

    pub venue_mode_enabled: bool,
    pub venue_capacity: u32,
    pub guests_in_venue: u32,

    /// Front-of-line eligibility window; 0 disables the ready pool
    pub ready_pool_limit: u32,

    /// Next synthetic guest index
    #[serde(default)]
    pub mock_counter: u64,

    /// Date of the last automatic daily reset
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            is_open: true,
            premium_limit: DEFAULT_PREMIUM_LIMIT,
            one_shot_price: DEFAULT_ONE_SHOT_PRICE,
            venue_mode_enabled: false,
            venue_capacity: 0,
            guests_in_venue: 0,
            ready_pool_limit: 0,
            mock_counter: 0,
            last_reset_date: None,
        }
    }
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entrants in line order.
    pub fn entries(&self) -> &[Entrant] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of an email, if it has a live entry. Surrounding whitespace is ignored.
    pub fn index_of(&self, email: &str) -> Option<usize> {
        let email = email.trim();
        self.entries.iter().position(|e| e.email == email)
    }

    /// Current lifecycle stage of an email.
    pub fn lifecycle_of(&self, email: &str) -> EntrantLifecycle {
        self.index_of(email)
            .map_or(EntrantLifecycle::Absent, |i| EntrantLifecycle::Queued {
                premium: self.entries[i].premium,
            })
    }

    /// Number of front entrants eligible for admission.
    ///
    /// With the ready pool disabled only the front entrant is eligible.
    pub fn ready_count(&self) -> usize {
        if self.ready_pool_limit > 0 {
            (self.ready_pool_limit as usize).min(self.entries.len())
        } else {
            usize::from(!self.entries.is_empty())
        }
    }

    /// The ready pool slice, empty when the pool is disabled.
    pub fn ready_pool(&self) -> &[Entrant] {
        if self.ready_pool_limit > 0 {
            &self.entries[..self.ready_count()]
        } else {
            &[]
        }
    }

    /// Premium entrants waiting behind position 0.
    pub fn pending_premium_count(&self) -> usize {
        self.entries.iter().skip(1).filter(|e| e.premium).count()
    }

    /// Check if the venue gate is closed. Always false outside venue mode.
    pub fn is_venue_full(&self) -> bool {
        self.venue_mode_enabled && self.guests_in_venue >= self.venue_capacity
    }

    // Joining and leaving

    /// Append a standard entrant. Returns false if the email was already in line.
    pub fn join(&mut self, email: &str) -> Result<bool> {
        let email = require_email(email)?;
        if !self.is_open {
            return Err(QueueError::QueueClosed);
        }
        if self.lifecycle_of(email).apply(EntrantEvent::Join).is_err() {
            return Ok(false);
        }
        self.entries.push(Entrant::standard(email));
        Ok(true)
    }

    /// Place an entrant in the premium lane, returning its new position.
    ///
    /// A standard entrant forfeits its place and re-enters through the lane.
    pub fn join_premium(&mut self, email: &str) -> Result<usize> {
        let email = require_email(email)?;
        if !self.is_open {
            return Err(QueueError::QueueClosed);
        }
        self.lifecycle_of(email)
            .apply(EntrantEvent::JoinPremium)
            .map_err(|_| QueueError::AlreadyPremium)?;

        // Count the lane as it will look once the old entry is gone.
        let existing = self.index_of(email);
        let pending_premium = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != existing)
            .skip(1)
            .filter(|(_, e)| e.premium)
            .count();
        if pending_premium >= self.premium_limit as usize {
            return Err(QueueError::NoPremiumSlotsAvailable);
        }

        if let Some(index) = existing {
            self.entries.remove(index);
        }
        let insert_at = (1..self.entries.len())
            .find(|&i| !self.entries[i].premium)
            .unwrap_or(self.entries.len());
        self.entries.insert(insert_at, Entrant::premium(email));
        Ok(insert_at)
    }

    /// 0-based position of an email.
    pub fn position(&self, email: &str) -> Result<usize> {
        self.index_of(email).ok_or(QueueError::NotInQueue)
    }

    pub fn is_premium(&self, email: &str) -> Result<bool> {
        self.index_of(email)
            .map(|i| self.entries[i].premium)
            .ok_or(QueueError::NotInQueue)
    }

    /// Remove the front entrant, counting it into the venue in venue mode.
    pub fn advance(&mut self) -> Result<Option<Entrant>> {
        if self.is_venue_full() {
            return Err(QueueError::VenueFull);
        }
        if self.entries.is_empty() {
            return Ok(None);
        }
        let entrant = self.entries.remove(0);
        if self.venue_mode_enabled {
            self.guests_in_venue += 1;
        }
        Ok(Some(entrant))
    }

    /// Remove an email from any position. Absent emails are a no-op.
    pub fn leave(&mut self, email: &str, policy: LeavePolicy) -> Result<Option<Entrant>> {
        let Some(index) = self.index_of(email) else {
            return Ok(None);
        };
        let admits = policy == LeavePolicy::Admit && self.venue_mode_enabled;
        if admits && self.is_venue_full() {
            return Err(QueueError::VenueFull);
        }
        let entrant = self.entries.remove(index);
        if admits {
            self.guests_in_venue += 1;
        }
        Ok(Some(entrant))
    }

    /// Admit a specific entrant if it is inside the ready threshold.
    pub fn scan(&mut self, email: &str) -> Result<Entrant> {
        if self.is_venue_full() {
            return Err(QueueError::VenueFull);
        }
        self.lifecycle_of(email)
            .apply(EntrantEvent::Admit)
            .map_err(|_| QueueError::NotInQueue)?;
        let position = self.position(email)?;
        let ready_count = self.ready_count();
        if position >= ready_count {
            return Err(QueueError::NotReady {
                position,
                ready_count,
            });
        }
        let entrant = self.entries.remove(position);
        if self.venue_mode_enabled {
            self.guests_in_venue += 1;
        }
        Ok(entrant)
    }

    // Basic queue settings

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Drop every entrant, keeping configuration and occupancy.
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    /// Drop every entrant and zero venue occupancy.
    pub fn clear_for_new_day(&mut self) -> usize {
        self.guests_in_venue = 0;
        self.clear()
    }

    /// Append `count` synthetic standard entrants, returning how many were added.
    ///
    /// Names come from `mock_counter`; any name already in line is skipped and
    /// the counter keeps moving until `count` new entrants are in. Counts above
    /// [`MAX_MOCK_GUESTS`] are rejected.
    pub fn seed_mock_guests(&mut self, count: usize) -> Result<usize> {
        if count > MAX_MOCK_GUESTS {
            return Err(QueueError::invalid(format!(
                "mock guest count must be at most {MAX_MOCK_GUESTS}"
            )));
        }
        let mut added = 0;
        while added < count {
            let email = format!("mock{}@{}", self.mock_counter, MOCK_GUEST_DOMAIN);
            self.mock_counter += 1;
            if self.index_of(&email).is_none() {
                self.entries.push(Entrant::standard(email));
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn reset_mock_counter(&mut self) {
        self.mock_counter = 0;
    }

    // Configuration

    pub fn set_premium_limit(&mut self, limit: i64) -> Result<()> {
        self.premium_limit = non_negative("premium limit", limit)?;
        Ok(())
    }

    pub fn set_one_shot_price(&mut self, price: f64) -> Result<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(QueueError::invalid(
                "one shot price must be a non-negative number",
            ));
        }
        self.one_shot_price = price;
        Ok(())
    }

    pub fn set_ready_pool_limit(&mut self, limit: i64) -> Result<()> {
        self.ready_pool_limit = non_negative("ready pool limit", limit)?;
        Ok(())
    }

    /// Set venue capacity. Refuses to drop below current occupancy in venue mode.
    pub fn set_venue_capacity(&mut self, capacity: i64) -> Result<()> {
        let capacity = non_negative("venue capacity", capacity)?;
        if self.venue_mode_enabled && capacity < self.guests_in_venue {
            return Err(QueueError::invalid(format!(
                "venue capacity {} is below current occupancy {}",
                capacity, self.guests_in_venue
            )));
        }
        self.venue_capacity = capacity;
        Ok(())
    }

    pub fn set_venue_mode(&mut self, enabled: bool) {
        self.venue_mode_enabled = enabled;
        if !enabled {
            self.guests_in_venue = 0;
        }
    }

    // Venue occupancy

    pub fn increment_guests_in_venue(&mut self) -> Result<()> {
        if self.is_venue_full() || !self.venue_mode_enabled {
            return Err(QueueError::VenueFull);
        }
        self.guests_in_venue += 1;
        Ok(())
    }

    pub fn decrement_guests_in_venue(&mut self) -> Result<()> {
        if !self.venue_mode_enabled || self.guests_in_venue == 0 {
            return Err(QueueError::NoGuestsInVenue);
        }
        self.guests_in_venue -= 1;
        Ok(())
    }

    /// Check the invariants a persisted snapshot must satisfy.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entrant in &self.entries {
            if entrant.email.trim().is_empty() {
                return Err("entrant with empty email".to_string());
            }
            if !seen.insert(entrant.email.as_str()) {
                return Err(format!("duplicate entrant {}", entrant.email));
            }
        }
        if self.venue_mode_enabled && self.guests_in_venue > self.venue_capacity {
            return Err(format!(
                "guests in venue {} exceeds capacity {}",
                self.guests_in_venue, self.venue_capacity
            ));
        }
        if !self.venue_mode_enabled && self.guests_in_venue != 0 {
            return Err(format!(
                "guests in venue {} with venue mode disabled",
                self.guests_in_venue
            ));
        }
        if !self.one_shot_price.is_finite() || self.one_shot_price < 0.0 {
            return Err("one shot price must be a non-negative number".to_string());
        }
        Ok(())
    }
}

/// Trimmed email, or `InvalidArgument` if nothing is left.
fn require_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(QueueError::invalid("email is required"));
    }
    Ok(email)
}

fn non_negative(field: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| QueueError::invalid(format!("{field} must be a non-negative integer")))
}
