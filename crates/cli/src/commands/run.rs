//! `stepline run` — execute one task through the loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stepline_agent::{LoopRunner, UnparseablePolicy};
use stepline_core::{Sink, Task};
use stepline_oracle::{GeminiOracle, RetryOracle};
use stepline_sinks::{ConsoleSink, TelegramSink, TelegramSinkConfig};
use tracing::debug;

/// Run a task. Returns whether the terminal result was a success.
pub async fn run(
    config_path: Option<PathBuf>,
    goal: String,
    max_steps: Option<u32>,
    model: Option<String>,
    lenient: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(max_steps) = max_steps {
        config.run.max_steps = max_steps;
    }
    if let Some(model) = model {
        config.oracle.model = model;
    }
    if lenient {
        config.run.on_unparseable = "accept-final".into();
    }
    config.validate()?;
    debug!(?config, "Effective configuration");

    let api_key = config.oracle.api_key.clone().ok_or(
        "no oracle API key configured (set oracle.api_key or STEPLINE_API_KEY)",
    )?;

    let mut backend = GeminiOracle::new(api_key)
        .map_err(|e| format!("failed to build oracle: {e}"))?
        .with_model(&config.oracle.model)
        .with_temperature(config.oracle.temperature);
    if let Some(base_url) = &config.oracle.base_url {
        backend = backend.with_base_url(base_url);
    }

    let oracle = RetryOracle::new(Arc::new(backend))
        .with_max_attempts(config.oracle.retry_attempts)
        .with_backoff(Duration::from_millis(config.oracle.retry_backoff_ms))
        .with_attempt_timeout(Duration::from_secs(config.oracle.timeout_secs));

    let registry = Arc::new(super::build_registry(&config)?);

    let policy = match config.run.on_unparseable.as_str() {
        "accept-final" => UnparseablePolicy::AcceptAsFinal,
        _ => UnparseablePolicy::Fail,
    };

    let runner = LoopRunner::new(Arc::new(oracle), registry)
        .with_max_steps(config.run.max_steps)
        .with_tool_timeout(Duration::from_secs(config.run.tool_timeout_secs))
        .with_unparseable_policy(policy)
        .with_skip_duplicates(config.run.skip_duplicate_calls);

    let sink: Box<dyn Sink> = match config.sink.kind.as_str() {
        "telegram" => {
            // validate() guarantees the credentials when the kind is telegram.
            let bot_token = config.notify.bot_token.clone().unwrap_or_default();
            let chat_id = config.notify.chat_id.clone().unwrap_or_default();
            Box::new(
                TelegramSink::new(TelegramSinkConfig { bot_token, chat_id })
                    .map_err(|e| format!("failed to build sink: {e}"))?,
            )
        }
        _ => Box::new(ConsoleSink),
    };

    let task = Task::new(goal);
    let result = runner.run_and_deliver(&task, sink.as_ref()).await;
    Ok(result.is_success())
}
