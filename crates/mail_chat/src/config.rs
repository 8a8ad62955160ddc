//! Layered client configuration.
//!
//! Precedence, lowest first: built-in defaults, the JSON file named by `--config` or
//! `MAIL_CHAT_CONFIG_PATH`, `MAIL_CHAT_*` environment variables, command-line flags.
//!
//! ```json
//! { "backend": "http", "base_url": "http://localhost:8000", "timeout_secs": 30 }
//! ```
//!
//! Every file field is optional. Unknown fields and blank strings are rejected. Blank
//! environment values are treated as unset.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV_VAR: &str = "MAIL_CHAT_CONFIG_PATH";
pub const BACKEND_ENV_VAR: &str = "MAIL_CHAT_BACKEND";
pub const BASE_URL_ENV_VAR: &str = "MAIL_CHAT_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "MAIL_CHAT_TIMEOUT_SECS";

pub const DEFAULT_BACKEND_ID: &str = "http";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config file {path} has a blank '{field}'")]
    BlankField { path: PathBuf, field: &'static str },

    #[error("{name} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub backend: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub backend: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    backend: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl ChatConfig {
    /// Resolves the configuration from the process environment and `overrides`.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    /// Resolves the configuration reading environment variables through `env`.
    pub fn resolve(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path = overrides
            .config_path
            .clone()
            .or_else(|| non_blank(env(CONFIG_PATH_ENV_VAR)).map(PathBuf::from));
        if let Some(path) = config_path {
            config.apply_file(&path)?;
        }

        if let Some(backend) = non_blank(env(BACKEND_ENV_VAR)) {
            config.backend = backend;
        }
        if let Some(base_url) = non_blank(env(BASE_URL_ENV_VAR)) {
            config.base_url = base_url;
        }
        if let Some(raw) = non_blank(env(TIMEOUT_ENV_VAR)) {
            config.timeout = parse_timeout(TIMEOUT_ENV_VAR, &raw)?;
        }

        if let Some(backend) = non_blank(overrides.backend.clone()) {
            config.backend = backend;
        }
        if let Some(base_url) = non_blank(overrides.base_url.clone()) {
            config.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            config.timeout = positive_timeout("--timeout-secs", timeout_secs)?;
        }

        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(backend) = file.backend {
            self.backend = required_field(path, "backend", backend)?;
        }
        if let Some(base_url) = file.base_url {
            self.base_url = required_field(path, "base_url", base_url)?;
        }
        if let Some(timeout_secs) = file.timeout_secs {
            let name = format!("timeout_secs in {}", path.display());
            self.timeout = positive_timeout(&name, timeout_secs)?;
        }

        Ok(())
    }
}

fn required_field(path: &Path, field: &'static str, value: String) -> Result<String, ConfigError> {
    non_blank(Some(value)).ok_or_else(|| ConfigError::BlankField {
        path: path.to_path_buf(),
        field,
    })
}

fn parse_timeout(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let seconds = raw.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout {
        name: name.to_string(),
        value: raw.to_string(),
    })?;
    positive_timeout(name, seconds)
}

fn positive_timeout(name: &str, seconds: u64) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::InvalidTimeout {
            name: name.to_string(),
            value: seconds.to_string(),
        });
    }
    Ok(Duration::from_secs(seconds))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
