//! Configuration loading and validation for the Ctrl Dot guard.
//!
//! Loads configuration from `~/.ctrldot/guard.toml` with environment
//! variable overrides. Explicit values passed by the embedding program
//! (or CLI flags) take precedence over both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Policy authority address.
pub const ENV_URL: &str = "CTRLDOT_URL";
/// Bearer credential sent on every request.
pub const ENV_AUTH_TOKEN: &str = "CTRLDOT_AUTH_TOKEN";
/// Default agent identity.
pub const ENV_AGENT_ID: &str = "CTRLDOT_AGENT_ID";
/// Default session identity.
pub const ENV_SESSION_ID: &str = "CTRLDOT_SESSION_ID";
/// Cheap model alternative for throttled model calls.
pub const ENV_CHEAP_MODEL: &str = "CTRLDOT_CHEAP_MODEL";

/// Agent modes understood by the policy authority.
pub const AGENT_MODES: [&str; 3] = ["normal", "cheap", "throttled"];

/// The root configuration structure.
///
/// Maps directly to `~/.ctrldot/guard.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Policy authority base address
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Upper bound on one round-trip to the policy authority
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Identity of the guarded agent
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Identity and model defaults for the guarded agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// One of `normal`, `cheap`, `throttled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,

    /// Enables the cheap-model branch of throttling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheap_model: Option<String>,
}

pub fn default_base_url() -> String {
    "http://127.0.0.1:7777".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &redact(&self.auth_token))
            .field("timeout_secs", &self.timeout_secs)
            .field("agent", &self.agent)
            .finish()
    }
}

impl GuardConfig {
    /// Load configuration from the default path, then apply the
    /// `CTRLDOT_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values count as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_URL) {
            self.base_url = url;
        }
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            self.auth_token = Some(token);
        }
        if let Some(agent_id) = get(ENV_AGENT_ID) {
            self.agent.agent_id = Some(agent_id);
        }
        if let Some(session_id) = get(ENV_SESSION_ID) {
            self.agent.session_id = Some(session_id);
        }
        if let Some(cheap_model) = get(ENV_CHEAP_MODEL) {
            self.agent.cheap_model = Some(cheap_model);
        }
    }

    /// Apply explicit overrides, which beat both file and environment.
    pub fn with_overrides(mut self, base_url: Option<String>, auth_token: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(token) = auth_token {
            self.auth_token = Some(token);
        }
        self
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ctrldot")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("guard.toml")
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "base_url must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(mode) = &self.agent.default_mode {
            if !AGENT_MODES.contains(&mode.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "agent.default_mode must be one of {} (got '{mode}')",
                    AGENT_MODES.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            agent: AgentConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
