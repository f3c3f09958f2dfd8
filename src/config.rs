//! Configuration file management for tlsnamecheck.
//!
//! Settings come from three layers, each overriding the one before:
//!
//! 1. Default values
//! 2. Configuration file (tlsnamecheck.toml or specified with --config)
//! 3. Command-line arguments
//!
//! # Example Configuration File
//!
//! ```toml
//! urls = ["https://example.com", "https://example.com:8443"]
//! output = "summary"
//! exit_code = 1
//! trusted_ca_file = "/etc/ssl/certs/ca-certificates.crt"
//! timeout_secs = 10
//! log_level = "info"
//! ```

use crate::session::DEFAULT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tlsnamecheck.toml";

/// Main configuration structure.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Endpoints to validate
    pub urls: Option<Vec<String>>,
    /// Output format: json, text, summary
    pub output: Option<String>,
    /// Exit code to use when an endpoint fails validation
    pub exit_code: Option<i32>,
    /// PEM bundle used as the only trust anchor
    pub trusted_ca_file: Option<String>,
    /// Connect and read timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Log filter directive, e.g. "info" or "tlsnamecheck=debug"
    pub log_level: Option<String>,
}

impl Default for Config {
    /// `output` "summary", `exit_code` 0, `timeout_secs` 30, `log_level` "warn".
    fn default() -> Self {
        Config {
            urls: None,
            output: Some("summary".to_string()),
            exit_code: Some(0),
            trusted_ca_file: None,
            timeout_secs: Some(DEFAULT_TIMEOUT),
            log_level: Some("warn".to_string()),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Merges this configuration with another, prioritizing the other's values.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.urls.is_some() {
            self.urls = other.urls;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if other.trusted_ca_file.is_some() {
            self.trusted_ca_file = other.trusted_ca_file;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self
    }

    /// Rejects values no run could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.urls {
            Some(urls) if !urls.is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(
                    "at least one URL is required".to_string(),
                ))
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(file) = &self.trusted_ca_file {
            if !Path::new(file).is_file() {
                return Err(ConfigError::Validation(format!(
                    "trusted_ca_file '{}' is not a readable file",
                    file
                )));
            }
        }
        Ok(())
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            urls: Some(vec![
                "https://example.com".to_string(),
                "https://example.com:8443".to_string(),
                "https://wrong.host.badssl.com".to_string(),
            ]),
            output: Some("summary".to_string()),
            exit_code: Some(1),
            trusted_ca_file: Some("/etc/ssl/certs/ca-certificates.crt".to_string()),
            timeout_secs: Some(10),
            log_level: Some("info".to_string()),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (missing required fields, invalid values, etc.)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
