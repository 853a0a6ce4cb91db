//! Engine configuration
//!
//! Loaded from TOML. Every field has a default so an empty file is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default longest stay a single reservation may cover
pub const DEFAULT_MAX_STAY_NIGHTS: i64 = 2;

/// Default number of notifications retained per user
pub const DEFAULT_NOTIFICATION_CAPACITY: u32 = 20;

/// Tunables for the reservation engine and its store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest stay accepted by the availability resolver, in nights
    pub max_stay_nights: i64,
    /// Notifications kept per user before the oldest are evicted
    pub notification_capacity: u32,
    /// How long a write waits on another connection's lock
    pub busy_timeout_ms: u64,
    /// Attempts at a contended transaction before reporting a conflict
    pub max_write_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stay_nights: DEFAULT_MAX_STAY_NIGHTS,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            busy_timeout_ms: 5_000,
            max_write_attempts: 3,
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Clamp capacity and write attempts to at least one
    pub(crate) fn sanitized(mut self) -> Self {
        self.notification_capacity = self.notification_capacity.max(1);
        self.max_write_attempts = self.max_write_attempts.max(1);
        self
    }
}
