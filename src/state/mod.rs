//! Queue state types and rules.
//!
//! - `entrant` - Entrant records and their lifecycle
//! - `queue` - Ordered line with premium lane, ready pool and venue gate
//! - `freshness` - Clock and cached-snapshot age tracking
//! - `reset` - Daily reset window
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           QueueState                             │
//! │                                                                  │
//! │   index:   0        1 .. k            k+1 .. n-1                 │
//! │          ┌─────┬─────────────────┬──────────────────────┐        │
//! │   queue: │front│  premium lane   │   standard entrants  │        │
//! │          └─────┴─────────────────┴──────────────────────┘        │
//! │          ◀── ready pool (first ready_pool_limit, or front) ──▶   │
//! │                                                                  │
//! │   advance / scan ──▶ guests_in_venue (≤ venue_capacity)          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use venue_queue::state::{LeavePolicy, QueueState};
//!
//! let mut state = QueueState::new();
//! state.join("a@x.com").unwrap();
//! state.join("b@x.com").unwrap();
//! state.join_premium("c@x.com").unwrap();
//!
//! assert_eq!(state.position("c@x.com").unwrap(), 1);
//! state.scan("a@x.com").unwrap();
//! state.leave("b@x.com", LeavePolicy::Release).unwrap();
//! ```

pub mod entrant;
pub mod freshness;
pub mod queue;
pub mod reset;

// Re-export commonly used types
pub use entrant::{Entrant, EntrantEvent, EntrantLifecycle, GuestLocation, InvalidTransition};
pub use freshness::{Clock, ManualClock, SnapshotAge, SystemClock, DEFAULT_FRESHNESS_WINDOW};
pub use queue::{
    LeavePolicy, QueueState, DEFAULT_ONE_SHOT_PRICE, DEFAULT_PREMIUM_LIMIT, MAX_MOCK_GUESTS,
};
pub use reset::{DailyResetReport, ResetSchedule, DEFAULT_RESET_HOUR_UTC};
