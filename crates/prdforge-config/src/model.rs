use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use prdforge_utils::logging::LogFormat;
use prdforge_utils::paths::{Layout, prdforge_home};

pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 15 * 60;
pub const DEFAULT_CACHE_MAX_ENTRY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_RETENTION_DAYS: u64 = 30;
pub const DEFAULT_SWEEP_EXTENSION: &str = "md";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// Built-in defaults only.
    #[default]
    Defaults,
    /// Loaded from this TOML file.
    File(PathBuf),
    /// Assembled through [`crate::ConfigBuilder`].
    Programmatic,
}

/// Effective prdforge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub sweep: SweepConfig,
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root holding `inputs/`, `outputs/` and `prompts/`. Falls back to
    /// `PRDFORGE_HOME`, then `.prdforge`.
    pub home: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub max_entry_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entry_bytes: DEFAULT_CACHE_MAX_ENTRY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Run the background sweeper at all.
    pub enabled: bool,
    pub interval_secs: u64,
    /// Snapshot artifacts older than this many days are deleted.
    pub retention_days: u64,
    /// Extension (without dot) of the artifacts subject to retention.
    pub extension: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            retention_days: DEFAULT_RETENTION_DAYS,
            extension: DEFAULT_SWEEP_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub format: LogFormat,
}

impl Config {
    /// Resolved home directory.
    #[must_use]
    pub fn home(&self) -> Utf8PathBuf {
        self.paths.home.clone().unwrap_or_else(prdforge_home)
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(self.home())
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep.interval_secs)
    }

    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.sweep.retention_days.saturating_mul(24 * 60 * 60))
    }
}
