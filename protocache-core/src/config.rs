//! Snapshot store configuration
//!
//! Values are loaded from environment variables with defaults suitable for a
//! single-process cache in front of the upstream API.

use crate::ConfigError;
use std::time::Duration;

/// Hard platform ceiling for the serialized snapshot: 30 MiB.
pub const HARD_MAX_DATA_SIZE_BYTES: usize = 30 * 1024 * 1024;

/// Snapshot TTL when none is configured: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration for the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStoreConfig {
    /// How long a snapshot stays fresh after it was cached.
    pub ttl: Duration,
    /// Largest serialized snapshot the store will accept.
    pub max_data_size_bytes: usize,
}

impl Default for SnapshotStoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_data_size_bytes: HARD_MAX_DATA_SIZE_BYTES,
        }
    }
}

impl SnapshotStoreConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from environment variables.
    ///
    /// Environment variables:
    /// - `PROTOCACHE_TTL_MS`: Snapshot TTL in milliseconds (default: 1800000)
    /// - `PROTOCACHE_MAX_DATA_SIZE_BYTES`: Size ceiling in bytes (default: 31457280)
    ///
    /// Unparseable values fall back to the defaults. The result is not
    /// validated here; the store validates on construction.
    pub fn from_env() -> Self {
        let ttl = env_parsed::<u64>("PROTOCACHE_TTL_MS")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TTL);
        let max_data_size_bytes =
            env_parsed("PROTOCACHE_MAX_DATA_SIZE_BYTES").unwrap_or(HARD_MAX_DATA_SIZE_BYTES);

        Self {
            ttl,
            max_data_size_bytes,
        }
    }

    /// Set the snapshot TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the size ceiling.
    pub fn with_max_data_size(mut self, bytes: usize) -> Self {
        self.max_data_size_bytes = bytes;
        self
    }

    /// TTL in whole milliseconds, saturating.
    pub fn ttl_ms(&self) -> u64 {
        u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX)
    }

    /// Validate the configuration.
    ///
    /// The size ceiling may not exceed [`HARD_MAX_DATA_SIZE_BYTES`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_data_size_bytes > HARD_MAX_DATA_SIZE_BYTES {
            return Err(ConfigError::InvalidValue {
                field: "max_data_size_bytes".to_string(),
                value: self.max_data_size_bytes.to_string(),
                reason: format!(
                    "max_data_size_bytes must not exceed {} bytes",
                    HARD_MAX_DATA_SIZE_BYTES
                ),
            });
        }

        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}
