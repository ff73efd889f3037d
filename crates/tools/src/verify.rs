//! Answer verification tool.
//!
//! Re-evaluates an expression and compares it against a claimed answer.
//! A mismatch is a valid observation, not an error — the oracle is
//! expected to note the discrepancy and correct its final answer.

use async_trait::async_trait;
use stepline_core::error::ToolError;
use stepline_core::step::Observation;
use stepline_core::tool::Tool;

use crate::expression::evaluate;
use crate::require_number;

const RELATIVE_EPSILON: f64 = 1e-9;

pub struct CheckAnswerTool;

#[async_trait]
impl Tool for CheckAnswerTool {
    fn name(&self) -> &str {
        "check_answer"
    }

    fn description(&self) -> &str {
        "Verify that an expression evaluates to the given answer."
    }

    fn params(&self) -> &[&str] {
        &["expression", "answer"]
    }

    async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
        let claimed = require_number(self.name(), "answer", &args[1])?;
        let actual = evaluate(&args[0]).map_err(|reason| ToolError::ExecutionFailed {
            tool: self.name().to_string(),
            reason,
        })?;

        let tolerance = RELATIVE_EPSILON * actual.abs().max(1.0);
        if (actual - claimed).abs() <= tolerance {
            Ok(Observation::Text(format!(
                "verified: {} = {}",
                args[0].trim(),
                Observation::Number(actual)
            )))
        } else {
            Ok(Observation::Text(format!(
                "mismatch: {} evaluates to {}, not {}",
                args[0].trim(),
                Observation::Number(actual),
                Observation::Number(claimed)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn correct_answer_verifies() {
        let tool = CheckAnswerTool;
        let obs = tool
            .invoke(&["(3 + 5) * 2".into(), "16".into()])
            .await
            .unwrap();
        assert_eq!(obs, Observation::Text("verified: (3 + 5) * 2 = 16".into()));
    }

    #[tokio::test]
    async fn wrong_answer_reports_mismatch() {
        let tool = CheckAnswerTool;
        let obs = tool
            .invoke(&["2 + 2".into(), "5".into()])
            .await
            .unwrap();
        match obs {
            Observation::Text(text) => {
                assert!(text.starts_with("mismatch"));
                assert!(text.contains("evaluates to 4, not 5"));
            }
            other => panic!("expected text observation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_floats_verify_within_tolerance() {
        let tool = CheckAnswerTool;
        let obs = tool
            .invoke(&["1 / 3".into(), "0.3333333333333333".into()])
            .await
            .unwrap();
        assert!(matches!(obs, Observation::Text(t) if t.starts_with("verified")));
    }

    #[tokio::test]
    async fn non_numeric_answer_is_recoverable_error() {
        let tool = CheckAnswerTool;
        let err = tool
            .invoke(&["2 + 2".into(), "four".into()])
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn bad_expression_is_recoverable_error() {
        let tool = CheckAnswerTool;
        let err = tool.invoke(&["2 +".into(), "2".into()]).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
