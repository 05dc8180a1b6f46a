//! Configuration management for rbsync.
//!
//! Connection settings come from command-line flags or environment variables
//! first and fall back to a TOML file (`.rbsync.toml` in the working
//! directory, then `<config dir>/rbsync/config.toml`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Application configuration as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runbook service connection settings
    pub remote: RemoteSettings,
}

/// Connection settings for the runbook service, all optional on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Host and optional port of the RBA API
    pub host: Option<String>,

    /// API key user
    pub user: Option<String>,

    /// API key password
    pub password: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self { host: None, user: None, password: None, timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct RemoteOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Fully resolved connection settings.
#[derive(Clone)]
pub struct RemoteConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Environment variables NOI_HOST, NOI_API_KEY_USER and NOI_API_KEY_PW need to be set \
         (missing: {})",
        .0.join(", ")
    )]
    Missing(Vec<&'static str>),

    #[error("Timeout must be greater than zero")]
    InvalidTimeout,
}

impl Config {
    /// Load configuration from the default locations.
    pub fn load() -> anyhow::Result<Self> {
        // Try local config first
        let local_config = PathBuf::from(".rbsync.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try global config
        if let Some(global_config) = Self::config_dir().map(|d| d.join("config.toml")) {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rbsync"))
    }

    /// Resolve connection settings, preferring explicit overrides.
    pub fn remote(&self, overrides: RemoteOverrides) -> Result<RemoteConfig, ConfigError> {
        let settings = &self.remote;
        let pick = |explicit: Option<String>, stored: &Option<String>| {
            explicit.or_else(|| stored.clone()).filter(|v| !v.is_empty())
        };

        let host = pick(overrides.host, &settings.host);
        let user = pick(overrides.user, &settings.user);
        let password = pick(overrides.password, &settings.password);

        let mut missing = Vec::new();
        if host.is_none() {
            missing.push("host");
        }
        if user.is_none() {
            missing.push("user");
        }
        if password.is_none() {
            missing.push("password");
        }

        match (host, user, password) {
            (Some(host), Some(user), Some(password)) => {
                if settings.timeout_secs == 0 {
                    return Err(ConfigError::InvalidTimeout);
                }
                Ok(RemoteConfig { host, user, password, timeout_secs: settings.timeout_secs })
            }
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}
