//! Step, history, and terminal-result domain types.
//!
//! These are the value objects that flow through the loop: the oracle emits
//! raw text → the parser decodes an intent → a tool may produce an
//! observation → the step is appended to the history. The history is the
//! sole piece of growing state and is exclusively owned by the loop runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded request to invoke a registered tool with positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Name of the tool to invoke. Must exist in the registry, or the step
    /// is recorded as a failure without any handler running.
    pub tool: String,

    /// Ordered argument strings, exactly as decoded from the oracle text.
    /// Type coercion is the handler's responsibility.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }

    /// A stable `tool|arg1|arg2` key used for duplicate-call detection.
    pub fn call_key(&self) -> String {
        let mut key = self.tool.clone();
        for arg in &self.args {
            key.push('|');
            key.push_str(arg);
        }
        key
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.tool, self.args.join(", "))
    }
}

/// What the oracle asked for this turn, decoded from its raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Invoke a named tool with positional arguments.
    Invoke(Invocation),

    /// The task is done; `payload` is the final answer, verbatim.
    Final { payload: String },

    /// The text matched neither literal form. Never guessed into an
    /// invocation.
    Unparseable,
}

/// A tool's return value, fed back into the oracle's context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Observation {
    Text(String),
    Number(f64),
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observation::Text(s) => write!(f, "{s}"),
            // Integers render without a trailing ".0" so the transcript
            // reads the way the oracle expects numbers to look.
            Observation::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

/// One iteration's record. Appended to the history, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// 1-based, strictly increasing, gapless.
    pub index: u32,

    /// The oracle's raw text for this turn.
    pub raw_text: String,

    /// What the parser decoded from the raw text.
    pub intent: Intent,

    /// The tool's result, when the intent was an invocation that ran
    /// (or failed recoverably — then this carries the error text).
    pub observation: Option<Observation>,

    /// When the step was recorded.
    pub at: DateTime<Utc>,
}

/// The ordered, append-only step history of one task execution.
///
/// Exclusively owned by the loop runner; oracles receive it read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    steps: Vec<Step>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, assigning the next gapless 1-based index.
    /// Returns the index of the recorded step.
    pub fn record(
        &mut self,
        raw_text: impl Into<String>,
        intent: Intent,
        observation: Option<Observation>,
    ) -> u32 {
        let index = self.steps.len() as u32 + 1;
        self.steps.push(Step {
            index,
            raw_text: raw_text.into(),
            intent,
            observation,
            at: Utc::now(),
        });
        index
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether an identical invocation has already been recorded.
    pub fn has_executed(&self, invocation: &Invocation) -> bool {
        let key = invocation.call_key();
        self.steps.iter().any(|s| match &s.intent {
            Intent::Invoke(prior) => prior.call_key() == key,
            _ => false,
        })
    }
}

/// How a task execution ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The oracle emitted a final answer; `value` is its payload, verbatim.
    Success { value: String },

    /// The loop broke: fatal oracle error, unparseable turn, or a tool
    /// contract violation. `reason` is human-readable.
    Failure { reason: String },

    /// A budget ran out — loop steps or oracle retries — before a final
    /// answer. Distinct from `Failure` so callers can tell "gave up due to
    /// cost limits" from "broke".
    Exhausted { reason: String },
}

/// The single final outcome of a task execution.
///
/// Produced exactly once, at loop termination, and handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalResult {
    pub outcome: Outcome,

    /// Number of steps recorded before termination.
    pub step_count: u32,
}

impl TerminalResult {
    pub fn success(value: impl Into<String>, step_count: u32) -> Self {
        Self {
            outcome: Outcome::Success {
                value: value.into(),
            },
            step_count,
        }
    }

    pub fn failure(reason: impl Into<String>, step_count: u32) -> Self {
        Self {
            outcome: Outcome::Failure {
                reason: reason.into(),
            },
            step_count,
        }
    }

    pub fn exhausted(reason: impl Into<String>, step_count: u32) -> Self {
        Self {
            outcome: Outcome::Exhausted {
                reason: reason.into(),
            },
            step_count,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// The final answer, when the outcome is success.
    pub fn value(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { value } => Some(value),
            _ => None,
        }
    }

    /// The human-readable reason, when the outcome is not success.
    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure { reason } | Outcome::Exhausted { reason } => Some(reason),
            Outcome::Success { .. } => None,
        }
    }
}

impl std::fmt::Display for TerminalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Outcome::Success { value } => {
                write!(f, "success: {value} ({} step(s))", self.step_count)
            }
            Outcome::Failure { reason } => {
                write!(f, "failure: {reason} ({} step(s))", self.step_count)
            }
            Outcome::Exhausted { reason } => {
                write!(f, "exhausted: {reason} ({} step(s))", self.step_count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_indices_are_gapless_from_one() {
        let mut history = History::new();
        history.record("FUNCTION_CALL: get_price|GOOG", Intent::Unparseable, None);
        history.record("FINAL_ANSWER: [42]", Intent::Final { payload: "42".into() }, None);

        let indices: Vec<u32> = history.steps().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn observation_formats_integers_without_fraction() {
        assert_eq!(Observation::Number(123.45).to_string(), "123.45");
        assert_eq!(Observation::Number(16.0).to_string(), "16");
        assert_eq!(Observation::Text("verified".into()).to_string(), "verified");
    }

    #[test]
    fn call_key_joins_tool_and_args() {
        let inv = Invocation::new("check_answer", vec!["2+2".into(), "4".into()]);
        assert_eq!(inv.call_key(), "check_answer|2+2|4");
    }

    #[test]
    fn duplicate_detection_matches_exact_calls_only() {
        let mut history = History::new();
        let first = Invocation::new("get_price", vec!["GOOG".into()]);
        history.record(
            "FUNCTION_CALL: get_price|GOOG",
            Intent::Invoke(first.clone()),
            Some(Observation::Number(123.45)),
        );

        assert!(history.has_executed(&first));
        assert!(!history.has_executed(&Invocation::new("get_price", vec!["MSFT".into()])));
    }

    #[test]
    fn terminal_result_accessors() {
        let ok = TerminalResult::success("123.45", 2);
        assert!(ok.is_success());
        assert_eq!(ok.value(), Some("123.45"));
        assert_eq!(ok.reason(), None);

        let spent = TerminalResult::exhausted("step budget of 12 exhausted", 12);
        assert!(!spent.is_success());
        assert_eq!(spent.reason(), Some("step budget of 12 exhausted"));
        assert_eq!(spent.step_count, 12);
    }

    #[test]
    fn step_serialization_roundtrip() {
        let mut history = History::new();
        history.record(
            "FUNCTION_CALL: evaluate_expression|2 + 3",
            Intent::Invoke(Invocation::new(
                "evaluate_expression",
                vec!["2 + 3".into()],
            )),
            Some(Observation::Number(5.0)),
        );

        let json = serde_json::to_string(&history).unwrap();
        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.steps()[0].index, 1);
        assert_eq!(
            back.steps()[0].observation,
            Some(Observation::Number(5.0))
        );
    }
}
