use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use prdforge_utils::error::ConfigError;
use prdforge_utils::paths::prdforge_home;

use super::{Config, ConfigSource};

const CONFIG_DIR: &str = ".prdforge";
const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Discover and load configuration starting from the current directory.
    pub fn discover() -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir)
    }

    /// Discover and load configuration starting from `start_dir`.
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path) -> Result<Self> {
        let config_path = match Self::discover_config_file_from(start_dir)? {
            Some(path) => Some(path),
            None => {
                let home_config = prdforge_home().join(CONFIG_FILE).into_std_path_buf();
                home_config.is_file().then_some(home_config)
            }
        };

        match config_path {
            Some(path) => Self::load(&path),
            None => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate an explicit configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(e.to_string()))
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;
        config.source = ConfigSource::File(path.to_path_buf());
        config.validate()?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Walk upward from `start_dir` looking for `.prdforge/config.toml`,
    /// stopping at the filesystem root or a repository root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists() {
                break;
            }

            current_dir = dir.parent();
        }

        Ok(None)
    }
}
