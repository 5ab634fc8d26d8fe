//! Engine configuration.
//!
//! Loaded from an optional TOML file, then overridden by `VENUE_QUEUE_*`
//! environment variables (`VENUE_QUEUE_APP_ID`, `VENUE_QUEUE_STORE`, ...).
//! Every key has a default, so an empty environment yields a working
//! in-memory engine.

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::state::{LeavePolicy, ResetSchedule, DEFAULT_FRESHNESS_WINDOW, DEFAULT_RESET_HOUR_UTC};
use crate::store::{KvStateStore, MemoryStateStore, StateStore};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "VENUE_QUEUE";

/// Which state store backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// Durable sled database at `store_path`
    Kv,
}

/// Engine settings for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deployment key partitioning persisted state
    pub app_id: String,

    /// Max age of the cached snapshot before a reload
    pub freshness_window_ms: u64,

    /// UTC hour of the automatic daily reset
    pub reset_hour_utc: u32,

    pub leave_policy: LeavePolicy,

    pub store: StoreBackend,

    /// sled database path, used by the `kv` backend
    pub store_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_id: "default".to_string(),
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW.as_millis() as u64,
            reset_hour_utc: DEFAULT_RESET_HOUR_UTC,
            leave_policy: LeavePolicy::default(),
            store: StoreBackend::default(),
            store_path: PathBuf::from("./venue-queue.db"),
        }
    }
}

impl EngineConfig {
    /// Load from an optional file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading engine config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(prefix).try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the type system does not cover.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid("app_id must not be empty".to_string()));
        }
        if ResetSchedule::at_hour(self.reset_hour_utc).is_none() {
            return Err(ConfigError::Invalid(format!(
                "reset_hour_utc must be 0-23, got {}",
                self.reset_hour_utc
            )));
        }
        Ok(())
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.freshness_window_ms)
    }

    /// Reset schedule, falling back to the default hour if out of range.
    pub fn reset_schedule(&self) -> ResetSchedule {
        ResetSchedule::at_hour(self.reset_hour_utc).unwrap_or_default()
    }

    /// Build the configured state store.
    pub fn open_store(&self) -> Result<Arc<dyn StateStore>, ConfigError> {
        match self.store {
            StoreBackend::Memory => Ok(Arc::new(MemoryStateStore::new())),
            StoreBackend::Kv => Ok(Arc::new(KvStateStore::open(&self.store_path)?)),
        }
    }
}
