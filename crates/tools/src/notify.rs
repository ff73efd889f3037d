//! Message notification tool (Telegram Bot API).
//!
//! Sends a message through `sendMessage`. Delivery failure is a
//! recoverable execution failure: the oracle is told the notification did
//! not go out and decides whether to proceed without it.

use async_trait::async_trait;
use serde::Serialize;
use stepline_core::error::ToolError;
use stepline_core::step::Observation;
use stepline_core::tool::Tool;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Telegram notification settings.
#[derive(Clone)]
pub struct NotifyConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Destination chat id.
    pub chat_id: String,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

pub struct SendMessageTool {
    config: NotifyConfig,
    base_url: String,
    client: reqwest::Client,
}

impl SendMessageTool {
    pub fn new(config: NotifyConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ToolError::ExecutionFailed {
                tool: "send_message".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            base_url: DEFAULT_BASE_URL.into(),
            client,
        })
    }

    /// Use a custom base URL (testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "send_message"
    }

    fn description(&self) -> &str {
        "Send a notification message to the configured chat."
    }

    fn params(&self) -> &[&str] {
        &["message"]
    }

    async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
        let text = args[0].as_str();
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.config.bot_token);

        debug!(chat_id = %self.config.chat_id, len = text.len(), "Sending notification");

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: &self.config.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool: self.name().to_string(),
                reason: format!("notification request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed {
                tool: self.name().to_string(),
                reason: format!(
                    "notification endpoint returned status {}",
                    response.status().as_u16()
                ),
            });
        }

        Ok(Observation::Text("message sent".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> NotifyConfig {
        NotifyConfig {
            bot_token: "123:secret-token".into(),
            chat_id: "42".into(),
        }
    }

    #[test]
    fn debug_redacts_bot_token() {
        let rendered = format!("{:?}", test_config());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("42"));
    }

    #[test]
    fn tool_declares_single_slot() {
        let tool = SendMessageTool::new(test_config()).unwrap();
        assert_eq!(tool.name(), "send_message");
        assert_eq!(tool.params(), &["message"]);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_recoverable() {
        // Port 9 (discard) refuses connections on most hosts; either way
        // the request cannot succeed and must map to a recoverable error.
        let tool = SendMessageTool::new(test_config())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = tool.invoke(&["hello".into()]).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
