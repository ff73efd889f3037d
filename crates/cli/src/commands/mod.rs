pub mod run;
pub mod tools_cmd;

use std::path::PathBuf;
use stepline_config::{AppConfig, ConfigError};
use stepline_core::error::ToolError;
use stepline_core::tool::ToolRegistry;
use stepline_tools::NotifyConfig;

/// Resolve the config path: explicit flag, or `~/.stepline/config.toml`.
pub(crate) fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".stepline").join("config.toml"),
        None => PathBuf::from(".stepline/config.toml"),
    }
}

pub(crate) fn load_config(explicit: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    AppConfig::load(&config_path(explicit))
}

/// Assemble the full registry: offline built-ins, the quote lookup, and —
/// when configured — the notification tool.
pub(crate) fn build_registry(config: &AppConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = stepline_tools::default_registry()?;
    registry.register(Box::new(stepline_tools::quote::QuoteLookupTool::new()?))?;

    if config.notify.enabled {
        // validate() guarantees both fields when enabled.
        let (Some(bot_token), Some(chat_id)) =
            (config.notify.bot_token.clone(), config.notify.chat_id.clone())
        else {
            return Ok(registry);
        };
        registry.register(Box::new(stepline_tools::notify::SendMessageTool::new(
            NotifyConfig { bot_token, chat_id },
        )?))?;
    }

    Ok(registry)
}
