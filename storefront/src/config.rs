//! Storefront configuration.
//!
//! Settings come from `CYCLECARE_*` environment variables layered over
//! per-environment defaults:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `CYCLECARE_ENV` | `development` (default), `staging` or `production` |
//! | `CYCLECARE_API_URL` | Backend base URL, required outside development |
//! | `CYCLECARE_STORAGE_PATH` | JSON file holding the persisted session and city |
//! | `CYCLECARE_LOG_LEVEL` | Default tracing level (`RUST_LOG` still wins) |
//! | `CYCLECARE_HTTP_TIMEOUT_SECS` | Per-request timeout |
//!
//! # Example
//!
//! ```no_run
//! use cyclecare_storefront::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! println!("Backend: {}", config.api_url);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Backend used when developing against a local server.
pub const DEV_API_URL: &str = "http://localhost:4000/api";

/// Default location of the persisted client state.
pub const DEFAULT_STORAGE_PATH: &str = ".cyclecare/storage.json";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is missing
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Unknown deployment environment
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// Variable present but unparsable
    #[error("Failed to parse {name}: {value}")]
    ParseError {
        /// Variable name
        name: String,
        /// Offending value
        value: String,
    },

    /// Values parse but make no sense together
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Pre-production
    Staging,
    /// Production
    Production,
}

impl Environment {
    /// Check if this is the production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is the development environment
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Storefront configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Backend base URL
    pub api_url: String,
    /// Persisted client state file
    pub storage_path: PathBuf,
    /// Default tracing level
    pub log_level: String,
    /// Per-request timeout in seconds
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Defaults for an environment, before any variable is applied.
    #[must_use]
    pub fn defaults(environment: Environment) -> Self {
        let (log_level, http_timeout_secs) = match environment {
            Environment::Development => ("debug", 30),
            Environment::Staging => ("info", 20),
            Environment::Production => ("warn", 15),
        };

        Self {
            environment,
            api_url: if environment.is_development() {
                DEV_API_URL.to_string()
            } else {
                String::new()
            },
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            log_level: log_level.to_string(),
            http_timeout_secs,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed, `CYCLECARE_API_URL` is
    /// missing outside development, or the result fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = lookup("CYCLECARE_ENV")
            .map(|value| value.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();
        let mut config = Self::defaults(environment);

        match lookup("CYCLECARE_API_URL") {
            Some(url) => config.api_url = url.trim().to_string(),
            None if !environment.is_development() => {
                return Err(ConfigError::EnvVarNotSet("CYCLECARE_API_URL".to_string()));
            },
            None => {},
        }
        if let Some(path) = lookup("CYCLECARE_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(level) = lookup("CYCLECARE_LOG_LEVEL") {
            config.log_level = level.trim().to_lowercase();
        }
        if let Some(value) = lookup("CYCLECARE_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = value.trim().parse().map_err(|_| ConfigError::ParseError {
                name: "CYCLECARE_HTTP_TIMEOUT_SECS".to_string(),
                value,
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        if self.environment.is_production() && !self.api_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(
                "api_url must use https in production".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "invalid log_level: {}. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults(Environment::Development)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn development_needs_nothing() {
        let config = load(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api_url, DEV_API_URL);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn production_requires_api_url() {
        assert_eq!(
            load(&[("CYCLECARE_ENV", "production")]),
            Err(ConfigError::EnvVarNotSet("CYCLECARE_API_URL".to_string()))
        );

        let config = load(&[
            ("CYCLECARE_ENV", "prod"),
            ("CYCLECARE_API_URL", "https://api.cyclecare.in"),
        ])
        .unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.http_timeout_secs, 15);
    }

    #[test]
    fn production_rejects_plain_http() {
        let err = load(&[
            ("CYCLECARE_ENV", "production"),
            ("CYCLECARE_API_URL", "http://api.cyclecare.in"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            ("CYCLECARE_ENV", "staging"),
            ("CYCLECARE_API_URL", "https://staging.cyclecare.in/api"),
            ("CYCLECARE_STORAGE_PATH", "/tmp/cyclecare.json"),
            ("CYCLECARE_LOG_LEVEL", "TRACE"),
            ("CYCLECARE_HTTP_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.storage_path, PathBuf::from("/tmp/cyclecare.json"));
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.http_timeout_secs, 5);
    }

    #[test]
    fn malformed_values_are_reported() {
        assert_eq!(
            load(&[("CYCLECARE_ENV", "qa")]),
            Err(ConfigError::InvalidEnvironment("qa".to_string()))
        );
        assert!(matches!(
            load(&[("CYCLECARE_HTTP_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(matches!(
            load(&[("CYCLECARE_HTTP_TIMEOUT_SECS", "0")]),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            load(&[("CYCLECARE_LOG_LEVEL", "loud")]),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn blank_variables_count_as_unset() {
        let config = load(&[("CYCLECARE_API_URL", "  "), ("CYCLECARE_ENV", "")]).unwrap();
        assert_eq!(config.api_url, DEV_API_URL);
    }
}
