#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Overrides the configuration directory when set
pub const CONFIG_DIR_ENV: &str = "DEMO_MCP_CONFIG_DIR";

pub const DEFAULT_SERVER_NAME: &str = "Demo";
pub const MAX_SERVER_NAME_LEN: usize = 64;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`
    pub name: String,
    /// Instructions returned to clients on initialize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            instructions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid server name: '{0}' (must be 1 to 64 characters)")]
    InvalidServerName(String),
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidLogFilter { filter: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default configuration rooted at `base_dir`
    #[inline]
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        dirs::home_dir()
            .map(|home| home.join(".demo-mcp"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("demo-mcp"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load from the default configuration directory
    #[inline]
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(config_dir)
    }

    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self::with_base_dir(config_dir));
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server_name(&self.name)
    }

    #[inline]
    pub fn set_name(&mut self, name: String) -> Result<(), ConfigError> {
        validate_server_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Blank instructions clear the field
    #[inline]
    pub fn set_instructions(&mut self, instructions: &str) {
        let trimmed = instructions.trim();
        self.instructions = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
}

impl LoggingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.env_filter().map(|_| ())
    }

    #[inline]
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.filter).map_err(|e| ConfigError::InvalidLogFilter {
            filter: self.filter.clone(),
            message: e.to_string(),
        })
    }

    #[inline]
    pub fn set_filter(&mut self, filter: String) -> Result<(), ConfigError> {
        let candidate = Self { filter };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

fn validate_server_name(name: &str) -> Result<(), ConfigError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_SERVER_NAME_LEN {
        return Err(ConfigError::InvalidServerName(name.to_string()));
    }
    Ok(())
}
