//! Configuration loading, validation, and management for stepline.
//!
//! Loads configuration from `~/.stepline/config.toml` (or an explicit
//! path) with environment variable overrides. Validates all settings
//! before the loop starts; secrets never appear in `Debug` output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration, mirroring `~/.stepline/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Oracle backend settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Loop settings
    #[serde(default)]
    pub run: RunConfig,

    /// Notification settings (Telegram tool + sink)
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Result sink selection
    #[serde(default)]
    pub sink: SinkConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("oracle", &self.oracle)
            .field("run", &self.run)
            .field("notify", &self.notify)
            .field("sink", &self.sink)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// API key for the oracle backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the API base URL (proxies, testing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_oracle_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry budget for transient failures
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Initial retry backoff in milliseconds (doubles per retry)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_oracle_timeout_secs() -> u64 {
    30
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            timeout_secs: default_oracle_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum loop steps before forced exhaustion
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Per-invocation tool timeout in seconds
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// "fail" (strict, default) or "accept-final" (lenient)
    #[serde(default = "default_on_unparseable")]
    pub on_unparseable: String,

    /// Skip invocations identical to one already executed
    #[serde(default = "default_true")]
    pub skip_duplicate_calls: bool,
}

fn default_max_steps() -> u32 {
    12
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_on_unparseable() -> String {
    "fail".into()
}
fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            tool_timeout_secs: default_tool_timeout_secs(),
            on_unparseable: default_on_unparseable(),
            skip_duplicate_calls: true,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whether the send_message tool and telegram sink are available
    #[serde(default)]
    pub enabled: bool,

    /// Telegram bot token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Telegram chat id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("enabled", &self.enabled)
            .field("bot_token", &redact(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// "console" or "telegram"
    #[serde(default = "default_sink_kind")]
    pub kind: String,
}

fn default_sink_kind() -> String {
    "console".into()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: default_sink_kind(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file, apply environment overrides, and validate.
    /// A missing file yields defaults (still subject to overrides).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `STEPLINE_*` / `TELEGRAM_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("STEPLINE_API_KEY") {
            self.oracle.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("STEPLINE_MODEL") {
            self.oracle.model = model;
        }
        if let Ok(base_url) = std::env::var("STEPLINE_BASE_URL") {
            self.oracle.base_url = Some(base_url);
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.notify.bot_token = Some(token);
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            self.notify.chat_id = Some(chat_id);
        }
    }

    /// Validate ranges and cross-field requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_steps == 0 {
            return Err(ConfigError::Invalid("run.max_steps must be at least 1".into()));
        }
        if !matches!(self.run.on_unparseable.as_str(), "fail" | "accept-final") {
            return Err(ConfigError::Invalid(format!(
                "run.on_unparseable must be 'fail' or 'accept-final', got '{}'",
                self.run.on_unparseable
            )));
        }
        if !(0.0..=2.0).contains(&self.oracle.temperature) {
            return Err(ConfigError::Invalid(format!(
                "oracle.temperature must be within 0.0..=2.0, got {}",
                self.oracle.temperature
            )));
        }
        if self.oracle.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "oracle.retry_attempts must be at least 1".into(),
            ));
        }
        if self.notify.enabled
            && (self.notify.bot_token.is_none() || self.notify.chat_id.is_none())
        {
            return Err(ConfigError::Invalid(
                "notify.enabled requires notify.bot_token and notify.chat_id".into(),
            ));
        }
        if !matches!(self.sink.kind.as_str(), "console" | "telegram") {
            return Err(ConfigError::Invalid(format!(
                "sink.kind must be 'console' or 'telegram', got '{}'",
                self.sink.kind
            )));
        }
        if self.sink.kind == "telegram" && !self.notify.enabled {
            return Err(ConfigError::Invalid(
                "sink.kind = 'telegram' requires notify.enabled".into(),
            ));
        }
        Ok(())
    }
}
