use prdforge_utils::error::ConfigError;

use super::Config;

const MAX_CACHE_ENTRIES: usize = 100_000;
const MAX_ENTRY_BYTES: usize = 64 * 1024 * 1024;

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Config {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(invalid("cache.max_entries", "must be greater than 0"));
        }
        if self.cache.max_entries > MAX_CACHE_ENTRIES {
            return Err(invalid(
                "cache.max_entries",
                "exceeds maximum limit of 100,000",
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be greater than 0"));
        }

        if self.cache.max_entry_bytes == 0 {
            return Err(invalid("cache.max_entry_bytes", "must be greater than 0"));
        }
        if self.cache.max_entry_bytes > MAX_ENTRY_BYTES {
            return Err(invalid(
                "cache.max_entry_bytes",
                "exceeds maximum limit of 64 MiB",
            ));
        }

        if self.sweep.interval_secs == 0 {
            return Err(invalid("sweep.interval_secs", "must be greater than 0"));
        }

        if self.sweep.retention_days == 0 {
            return Err(invalid("sweep.retention_days", "must be at least 1 day"));
        }

        let ext = self.sweep.extension.as_str();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(invalid(
                "sweep.extension",
                "must be a bare extension such as \"md\"",
            ));
        }

        if let Some(home) = &self.paths.home {
            if home.as_str().trim().is_empty() {
                return Err(invalid("paths.home", "must not be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_and_oversized_values() {
        let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
            ("cache.max_entries", Box::new(|c| c.cache.max_entries = 0)),
            ("cache.max_entries", Box::new(|c| c.cache.max_entries = 200_000)),
            ("cache.ttl_secs", Box::new(|c| c.cache.ttl_secs = 0)),
            ("cache.max_entry_bytes", Box::new(|c| c.cache.max_entry_bytes = 0)),
            ("sweep.interval_secs", Box::new(|c| c.sweep.interval_secs = 0)),
            ("sweep.retention_days", Box::new(|c| c.sweep.retention_days = 0)),
            ("sweep.extension", Box::new(|c| c.sweep.extension = ".md".into())),
            ("sweep.extension", Box::new(|c| c.sweep.extension = String::new())),
        ];

        for (expected_key, mutate) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("expected InvalidValue for {expected_key}, got {other:?}"),
            }
        }
    }
}
