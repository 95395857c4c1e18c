use camino::Utf8PathBuf;
use std::time::Duration;

use prdforge_utils::error::ConfigError;
use prdforge_utils::logging::LogFormat;

use super::{Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the engine without config files or
    /// environment variables.
    ///
    /// ```rust
    /// use prdforge_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .home("/srv/prdforge")
    ///     .max_entries(2)
    ///     .cache_ttl(Duration::from_secs(60))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.cache.max_entries, 2);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`]. Unset values keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    home: Option<Utf8PathBuf>,
    max_entries: Option<usize>,
    cache_ttl: Option<Duration>,
    max_entry_bytes: Option<usize>,
    sweep_enabled: Option<bool>,
    sweep_interval: Option<Duration>,
    retention_days: Option<u64>,
    sweep_extension: Option<String>,
    verbose: Option<bool>,
    log_format: Option<LogFormat>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn home(mut self, home: impl Into<Utf8PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    #[must_use]
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// TTL is stored with whole-second precision; sub-second values round up.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn max_entry_bytes(mut self, bytes: usize) -> Self {
        self.max_entry_bytes = Some(bytes);
        self
    }

    #[must_use]
    pub fn sweep_enabled(mut self, enabled: bool) -> Self {
        self.sweep_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn retention_days(mut self, days: u64) -> Self {
        self.retention_days = Some(days);
        self
    }

    #[must_use]
    pub fn sweep_extension(mut self, extension: impl Into<String>) -> Self {
        self.sweep_extension = Some(extension.into());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Assemble and validate the configuration.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError::InvalidValue`] raised by [`Config::validate`].
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config {
            source: ConfigSource::Programmatic,
            ..Config::default()
        };

        if let Some(home) = self.home {
            config.paths.home = Some(home);
        }
        if let Some(max_entries) = self.max_entries {
            config.cache.max_entries = max_entries;
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache.ttl_secs = whole_secs(ttl);
        }
        if let Some(bytes) = self.max_entry_bytes {
            config.cache.max_entry_bytes = bytes;
        }
        if let Some(enabled) = self.sweep_enabled {
            config.sweep.enabled = enabled;
        }
        if let Some(interval) = self.sweep_interval {
            config.sweep.interval_secs = whole_secs(interval);
        }
        if let Some(days) = self.retention_days {
            config.sweep.retention_days = days;
        }
        if let Some(extension) = self.sweep_extension {
            config.sweep.extension = extension;
        }
        if let Some(verbose) = self.verbose {
            config.logging.verbose = verbose;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

fn whole_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
