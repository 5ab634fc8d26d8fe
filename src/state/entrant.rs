//! Entrant records and the per-entrant lifecycle.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────────┐  join           ┌────────────────────┐
//! │  Absent  │────────────────▶│ Queued (standard)  │
//! └────┬─────┘                 └─────────┬──────────┘
//!      │                                 │ join_premium
//!      │ join_premium                    ▼ (position forfeited)
//!      │                       ┌────────────────────┐
//!      └──────────────────────▶│ Queued (premium)   │
//!                              └─────────┬──────────┘
//!                                        │
//!                 ┌──────────────────────┴──────────────┐
//!                 │ scan / advance                      │ leave / clear / reset
//!                 ▼                                     ▼
//!          ┌────────────┐                        ┌────────────┐
//!          │  Admitted  │                        │  Removed   │
//!          └────────────┘                        └────────────┘
//! ```
//!
//! `Admitted` and `Removed` are terminal. Joining again after either creates a
//! new record that starts from `Absent`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single queued identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    /// Identifier the guest joined with
    pub email: String,

    /// Whether the guest holds a premium slot
    pub premium: bool,
}

impl Entrant {
    /// Create a standard entrant.
    pub fn standard(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            premium: false,
        }
    }

    /// Create a premium entrant.
    pub fn premium(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            premium: true,
        }
    }
}

/// Derived location tag reported for each entrant in a status view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuestLocation {
    /// Inside the ready threshold, eligible for admission
    #[serde(rename = "ready")]
    Ready,

    /// Waiting behind the ready threshold
    #[serde(rename = "in queue")]
    InQueue,
}

impl GuestLocation {
    /// Tag for the entrant at `index` given the current ready count.
    pub fn at(index: usize, ready_count: usize) -> Self {
        if index < ready_count {
            Self::Ready
        } else {
            Self::InQueue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InQueue => "in queue",
        }
    }
}

impl fmt::Display for GuestLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entrant record is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntrantLifecycle {
    /// No live entry for this email
    #[default]
    Absent,

    /// In line
    Queued { premium: bool },

    /// Removed from the line by admission (scan or advance)
    Admitted,

    /// Removed from the line without admission
    Removed,
}

impl EntrantLifecycle {
    /// Check if the record is in line.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// Check if the record is in line holding a premium slot.
    pub fn is_premium(&self) -> bool {
        matches!(self, Self::Queued { premium: true })
    }

    /// Check if the record can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Admitted | Self::Removed)
    }

    /// Apply an event, returning the new state or an error.
    pub fn apply(&self, event: EntrantEvent) -> Result<Self, InvalidTransition> {
        use EntrantEvent::*;
        use EntrantLifecycle::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: *self,
            event,
            reason,
        };

        match (self, event) {
            (Admitted | Removed, _) => Err(invalid("Entrant record is closed")),

            (Absent, Join) => Ok(Queued { premium: false }),
            (Queued { .. }, Join) => Err(invalid("Already in queue")),

            (Absent, JoinPremium) => Ok(Queued { premium: true }),
            (Queued { premium: false }, JoinPremium) => Ok(Queued { premium: true }),
            (Queued { premium: true }, JoinPremium) => Err(invalid("Already premium")),

            (Queued { .. }, Admit) => Ok(Admitted),
            (Queued { .. }, Remove) => Ok(Removed),
            (Absent, Admit | Remove) => Err(invalid("Not in queue")),
        }
    }
}

impl fmt::Display for EntrantLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Queued { premium: false } => write!(f, "Queued(standard)"),
            Self::Queued { premium: true } => write!(f, "Queued(premium)"),
            Self::Admitted => write!(f, "Admitted"),
            Self::Removed => write!(f, "Removed"),
        }
    }
}

/// Lifecycle transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrantEvent {
    Join,
    JoinPremium,
    Admit,
    Remove,
}

/// Error when a lifecycle transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: EntrantLifecycle,
    pub event: EntrantEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}
