//! Error types for the queue engine and its state stores.

use thiserror::Error;

/// Caller-facing rejection of a single queue operation.
///
/// None of these are retried internally. A failed operation leaves the queue
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Queue is closed.")]
    QueueClosed,

    #[error("Guest already in premium queue.")]
    AlreadyPremium,

    #[error("No premium slots available.")]
    NoPremiumSlotsAvailable,

    #[error("Guest not in queue.")]
    NotInQueue,

    #[error("Venue is full.")]
    VenueFull,

    #[error("No guests in venue to remove.")]
    NoGuestsInVenue,

    /// Guest exists but sits behind the ready threshold.
    #[error("Guest is not ready (position {position}, ready count {ready_count}).")]
    NotReady { position: usize, ready_count: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl QueueError {
    /// Stable snake_case code for request layers that map errors to statuses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueueClosed => "queue_closed",
            Self::AlreadyPremium => "already_premium",
            Self::NoPremiumSlotsAvailable => "no_premium_slots_available",
            Self::NotInQueue => "not_in_queue",
            Self::VenueFull => "venue_full",
            Self::NoGuestsInVenue => "no_guests_in_venue",
            Self::NotReady { .. } => "not_ready",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result alias for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Failure talking to a state store backend.
///
/// The engine absorbs these; they never reach queue callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key-value backend error: {0}")]
    Kv(#[from] sled::Error),

    #[error("Snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Failure loading or validating [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to open state store: {0}")]
    Store(#[from] StoreError),
}
