//! Telegram sink — pushes terminal results to a chat via the Bot API.

use async_trait::async_trait;
use serde::Serialize;
use stepline_core::error::SinkError;
use stepline_core::{Outcome, Sink, Task, TerminalResult};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Telegram sink configuration.
#[derive(Clone)]
pub struct TelegramSinkConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Destination chat id.
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramSinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSinkConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

pub struct TelegramSink {
    config: TelegramSinkConfig,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramSink {
    pub fn new(config: TelegramSinkConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SinkError::DeliveryFailed {
                sink: "telegram".into(),
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

    fn render(task: &Task, result: &TerminalResult) -> String {
        match &result.outcome {
            Outcome::Success { value } => {
                format!("Task: {}\nAnswer: {}", task.goal(), value)
            }
            Outcome::Failure { reason } => {
                format!("Task: {}\nFailed after {} step(s): {}", task.goal(), result.step_count, reason)
            }
            Outcome::Exhausted { reason } => {
                format!("Task: {}\nGave up after {} step(s): {}", task.goal(), result.step_count, reason)
            }
        }
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[async_trait]
impl Sink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, task: &Task, result: &TerminalResult) -> Result<(), SinkError> {
        let text = Self::render(task, result);
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.config.bot_token);

        debug!(chat_id = %self.config.chat_id, "Delivering terminal result");

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: &self.config.chat_id,
                text: &text,
            })
            .send()
            .await
            .map_err(|e| SinkError::DeliveryFailed {
                sink: "telegram".into(),
                reason: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SinkError::DeliveryFailed {
                sink: "telegram".into(),
                reason: format!("endpoint returned status {}", response.status().as_u16()),
            });
        }

        Ok(())
    }
}
