//! Built-in tool implementations for stepline.
//!
//! Tools are the operations the oracle can request through the registry:
//! evaluate a math expression, verify an answer, fetch a stock quote,
//! send a Telegram message, emit canvas markup.
//!
//! Arguments arrive as positional strings; coercion to numbers happens
//! here, in the handlers, via [`require_number`].

pub mod canvas;
pub mod expression;
pub mod notify;
pub mod quote;
pub mod verify;

use stepline_core::error::ToolError;
use stepline_core::tool::ToolRegistry;

pub use notify::NotifyConfig;

/// Create a registry with the offline built-in tools.
///
/// Network-backed tools (`get_price`, `send_message`) are added only when
/// configured, so a default registry works without credentials.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(expression::EvaluateExpressionTool))?;
    registry.register(Box::new(verify::CheckAnswerTool))?;
    registry.register(Box::new(canvas::DrawRectangleTool))?;
    registry.register(Box::new(canvas::DrawTextTool))?;
    Ok(registry)
}

/// Coerce a positional string argument into a number.
///
/// Produces a recoverable `InvalidArgument` so the oracle sees what was
/// wrong and can correct itself next turn.
pub(crate) fn require_number(tool: &str, slot: &str, raw: &str) -> Result<f64, ToolError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ToolError::InvalidArgument {
            tool: tool.to_string(),
            slot: slot.to_string(),
            reason: format!("expected a number, got '{raw}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_offline_tools() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "check_answer",
                "draw_rectangle",
                "draw_text",
                "evaluate_expression",
            ]
        );
    }

    #[test]
    fn require_number_coerces_and_rejects() {
        assert_eq!(require_number("t", "x", " 16 ").unwrap(), 16.0);
        assert_eq!(require_number("t", "x", "123.45").unwrap(), 123.45);

        let err = require_number("check_answer", "answer", "sixteen").unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("sixteen"));
    }
}
