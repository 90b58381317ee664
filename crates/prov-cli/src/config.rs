//! Configuration management for provrec
//!
//! Configuration is stored in TOML format at the platform config directory:
//!
//! - Linux: `~/.config/provrec/config.toml`
//! - macOS: `~/Library/Application Support/io.provrec.provrec/config.toml`
//! - Windows: `%APPDATA%\provrec\provrec\config\config.toml`
//!
//! Command-line flags take precedence over file values.

use std::path::{Path, PathBuf};

use prov_record::PROTOCOL_BITSWAP;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// provrec configuration
///
/// # Example TOML
///
/// ```toml
/// [identity]
/// key_path = "/etc/provrec/peer.key"
///
/// [record]
/// protocol = "transport-bitswap"
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Signing key location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path to the peer key file used by `sign` and `peer-id`
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

/// Record defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Protocol tag written into new envelopes
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    PROTOCOL_BITSWAP.to_string()
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location, or defaults if absent
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Platform-specific default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "provrec", "provrec")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_config_file(path, &self.to_toml()?)
    }

    /// Write the commented sample configuration to `path`
    pub fn write_sample(path: &Path) -> Result<(), ConfigError> {
        write_config_file(path, Self::sample_toml())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        if self.record.protocol.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "record.protocol must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# provrec configuration

[identity]
# Path to the peer key file: {"version": 1, "ed25519_seed": "<hex>"}
# key_path = "/etc/provrec/peer.key"

[record]
# Protocol tag written into new envelopes
protocol = "transport-bitswap"

[output]
# Output format: "table", "json", "quiet"
format = "table"
verbose = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

fn write_config_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_format: Option<String>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    pub protocol: Option<String>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if let Some(true) = overrides.debug {
            self.logging.level = "debug".to_string();
        }
        if let Some(ref protocol) = overrides.protocol {
            self.record.protocol = protocol.clone();
        }
        self
    }
}
