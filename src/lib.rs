//! Venue Queue Library
//!
//! This crate provides the queue ordering and admission engine for a
//! single-line venue check-in.
//!
//! # Overview
//!
//! - **Queue Rules** - Ordered line with a capped premium lane behind the
//!   front, an optional ready pool of admissible entrants, and an optional
//!   venue-capacity gate.
//!
//! - **Queue Engine** - Wraps the rules in a reload-if-stale / save-on-change
//!   discipline so independent, short-lived processes converge on one view.
//!
//! - **State Stores** - Process-local and durable (sled) snapshot stores keyed
//!   by deployment.
//!
//! # Design Principles
//!
//! 1. **Validate before mutating** - A rejected operation leaves the line untouched.
//!
//! 2. **Best-effort persistence** - Store failures are logged, never surfaced;
//!    the in-process copy stays authoritative.
//!
//! 3. **No networking** - Request handling lives elsewhere.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use venue_queue::{QueueEngine, QueueError, store::MemoryStateStore};
//!
//! let mut engine = QueueEngine::new("deli", Arc::new(MemoryStateStore::new()));
//!
//! engine.join("a@x.com").unwrap();
//! engine.join("b@x.com").unwrap();
//! engine.join_premium("c@x.com").unwrap();
//!
//! assert_eq!(engine.position("c@x.com").unwrap(), 1);
//! assert!(matches!(engine.scan("b@x.com"), Err(QueueError::NotReady { .. })));
//!
//! engine.advance().unwrap();
//! assert_eq!(engine.snapshot().entries()[0].email, "c@x.com");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod store;

pub use config::{EngineConfig, StoreBackend};
pub use engine::{GuestStatus, PersistStatus, QueueEngine, QueueStatus};
pub use error::{ConfigError, QueueError, Result, StoreError};
pub use state::{DailyResetReport, Entrant, GuestLocation, LeavePolicy, QueueState};
pub use store::{KvStateStore, MemoryStateStore, StateStore};
