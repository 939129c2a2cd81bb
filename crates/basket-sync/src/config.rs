//! # Sync Configuration
//!
//! Configuration for the sync engine.
//!
//! ## Configuration Sources
//! 1. Environment variables (highest priority): `BASKET_SYNC_INTERVAL_MS`
//! 2. TOML config file: `<config dir>/basket/sync.toml`
//! 3. Default values
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [sync]
//! interval_ms = 30000
//! trigger_queue = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::SyncResult;

/// Default interval between timer-driven sync cycles.
const DEFAULT_INTERVAL_MS: u64 = 30_000;

/// Default capacity of the post-write trigger queue.
const DEFAULT_TRIGGER_QUEUE: usize = 8;

// =============================================================================
// Sync Configuration
// =============================================================================

/// Sync engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between timer-driven sync cycles, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Capacity of the bounded channel carrying post-write sync triggers.
    ///
    /// A full queue drops the trigger; the interval timer and the engine's
    /// reentrancy guard make the drop harmless.
    #[serde(default = "default_trigger_queue")]
    pub trigger_queue: usize,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_trigger_queue() -> usize {
    DEFAULT_TRIGGER_QUEUE
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            interval_ms: DEFAULT_INTERVAL_MS,
            trigger_queue: DEFAULT_TRIGGER_QUEUE,
        }
    }
}

/// On-disk file shape: settings live under a `[sync]` table.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sync: Option<SyncConfig>,
}

impl SyncConfig {
    /// Loads configuration from the given path (or the platform default
    /// location), falling back to defaults when the file is absent or
    /// malformed, then applies environment overrides.
    ///
    /// A malformed file is logged and ignored rather than failing startup -
    /// sync with default settings beats no sync.
    pub fn load_or_default(path: Option<PathBuf>) -> Self {
        let path = path.or_else(Self::default_path);

        let mut config = match path {
            Some(ref p) if p.exists() => match Self::load(p) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, path = %p.display(), "Failed to load sync config, using defaults");
                    SyncConfig::default()
                }
            },
            _ => SyncConfig::default(),
        };

        config.apply_env();
        config
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &PathBuf) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&raw)?;

        debug!(path = %path.display(), "Loaded sync config");
        Ok(file.sync.unwrap_or_default())
    }

    /// Platform config file location: `<config dir>/basket/sync.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("app", "basket", "basket")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    /// Applies environment variable overrides.
    fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var("BASKET_SYNC_INTERVAL_MS") {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => self.interval_ms = ms,
                _ => warn!(value = %raw, "Ignoring invalid BASKET_SYNC_INTERVAL_MS"),
            }
        }
    }

    /// Validates settings before the engine starts.
    pub fn validate(&self) -> SyncResult<()> {
        if self.interval_ms == 0 {
            return Err(crate::error::SyncError::InvalidConfig(
                "interval_ms must be positive".into(),
            ));
        }
        if self.trigger_queue == 0 {
            return Err(crate::error::SyncError::InvalidConfig(
                "trigger_queue must be positive".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.interval_ms, 30_000);
        assert_eq!(config.trigger_queue, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = SyncConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            [sync]
            interval_ms = 5000
            "#,
        )
        .unwrap();

        let config = file.sync.unwrap();
        assert_eq!(config.interval_ms, 5_000);
        // Missing fields fall back to serde defaults
        assert_eq!(config.trigger_queue, 8);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.sync.is_none());
    }
}
