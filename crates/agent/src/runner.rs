//! The loop runner — a bounded state machine over oracle turns.
//!
//! States: `AWAITING_ORACLE → DECODING → {INVOKING, FINALIZING, FAILING}
//! → AWAITING_ORACLE | TERMINATED`.
//!
//! Only tool execution failures are absorbed and converted into
//! loop-continuing observations; every other error class terminates the
//! machine with a terminal result carrying a human-readable reason. The
//! step budget is enforced on entry to `AWAITING_ORACLE` and after each
//! invocation, so a cooperative-but-unhelpful oracle can never spin the
//! loop forever.

use std::sync::Arc;
use std::time::{Duration, Instant};

use stepline_core::error::{OracleError, ToolError};
use stepline_core::{
    CancelHandle, DomainEvent, EventBus, History, Intent, Invocation, Observation, Oracle, Sink,
    Task, TerminalResult, ToolRegistry,
};
use stepline_protocol::{decode_turn, system_instructions};
use tracing::{debug, info, warn};

const DEFAULT_MAX_STEPS: u32 = 12;
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a turn matches neither literal form.
///
/// The source behaviors disagreed here; the strict default terminates, and
/// leniency is an explicit opt-in, never silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnparseablePolicy {
    /// Terminate with `Failure` (default).
    #[default]
    Fail,
    /// Accept the raw text, trimmed, as the final answer.
    AcceptAsFinal,
}

/// The loop controller for one or more task executions.
///
/// Stateless across runs: each `run` owns its history and step counter
/// exclusively, so concurrent tasks share nothing but the read-only
/// registry behind the `Arc`.
pub struct LoopRunner {
    oracle: Arc<dyn Oracle>,
    tools: Arc<ToolRegistry>,
    instructions: String,
    max_steps: u32,
    tool_timeout: Duration,
    on_unparseable: UnparseablePolicy,
    skip_duplicate_calls: bool,
    event_bus: Arc<EventBus>,
}

/// Loop phases. `Terminated` is represented by breaking out of the drive
/// loop with the terminal result.
enum Phase {
    AwaitOracle,
    Decode { raw: String },
    Invoke { raw: String, invocation: Invocation },
    Finalize { raw: String, payload: String },
    Fail { exhausted: bool, reason: String },
}

impl LoopRunner {
    /// Create a runner over an oracle and a tool registry.
    ///
    /// The system instructions are rendered once from the registry — the
    /// registry is immutable after process start.
    pub fn new(oracle: Arc<dyn Oracle>, tools: Arc<ToolRegistry>) -> Self {
        let instructions = system_instructions(&tools.summaries());
        Self {
            oracle,
            tools,
            instructions,
            max_steps: DEFAULT_MAX_STEPS,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            on_unparseable: UnparseablePolicy::default(),
            skip_duplicate_calls: true,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Set the step budget (minimum 1).
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Set the per-invocation tool timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Set the unparseable-turn policy.
    pub fn with_unparseable_policy(mut self, policy: UnparseablePolicy) -> Self {
        self.on_unparseable = policy;
        self
    }

    /// Enable or disable the duplicate-invocation guard.
    pub fn with_skip_duplicates(mut self, enabled: bool) -> Self {
        self.skip_duplicate_calls = enabled;
        self
    }

    /// Attach an event bus for domain events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Execute a task to its single terminal result.
    pub async fn run(&self, task: &Task) -> TerminalResult {
        self.run_with_cancel(task, &CancelHandle::new()).await
    }

    /// Execute a task, observing a cancellation handle between steps.
    pub async fn run_with_cancel(&self, task: &Task, cancel: &CancelHandle) -> TerminalResult {
        info!(task_id = %task.id(), max_steps = self.max_steps, "Loop starting");

        let mut history = History::new();
        let mut phase = Phase::AwaitOracle;

        let result = loop {
            phase = match phase {
                Phase::AwaitOracle => self.await_oracle(task, &history, cancel).await,
                Phase::Decode { raw } => self.decode(raw, &mut history),
                Phase::Invoke { raw, invocation } => {
                    self.invoke(raw, invocation, &mut history).await
                }
                Phase::Finalize { raw, payload } => {
                    history.record(raw, Intent::Final { payload: payload.clone() }, None);
                    break TerminalResult::success(payload, history.len());
                }
                Phase::Fail { exhausted, reason } => {
                    break if exhausted {
                        TerminalResult::exhausted(reason, history.len())
                    } else {
                        TerminalResult::failure(reason, history.len())
                    };
                }
            };

            // A cancelled task stops advancing at the next step boundary.
            if cancel.is_cancelled() && matches!(phase, Phase::AwaitOracle) {
                break TerminalResult::failure(
                    format!("cancelled before step {}", history.len() + 1),
                    history.len(),
                );
            }
        };

        self.event_bus.publish(DomainEvent::TaskTerminated {
            task_id: task.id().to_string(),
            status: match &result.outcome {
                stepline_core::Outcome::Success { .. } => "success".into(),
                stepline_core::Outcome::Failure { .. } => "failure".into(),
                stepline_core::Outcome::Exhausted { .. } => "exhausted".into(),
            },
            step_count: result.step_count,
            timestamp: chrono::Utc::now(),
        });

        info!(task_id = %task.id(), steps = result.step_count, "Loop terminated: {result}");
        result
    }

    /// Execute a task and hand the terminal result to a sink.
    ///
    /// Delivery failures are logged and published, never silently dropped,
    /// and never change the terminal result.
    pub async fn run_and_deliver(&self, task: &Task, sink: &dyn Sink) -> TerminalResult {
        let result = self.run(task).await;

        if let Err(e) = sink.deliver(task, &result).await {
            warn!(sink = sink.name(), error = %e, "Terminal result delivery failed");
            self.event_bus.publish(DomainEvent::DeliveryFailed {
                task_id: task.id().to_string(),
                sink: sink.name().to_string(),
                reason: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
        }

        result
    }

    async fn await_oracle(&self, task: &Task, history: &History, cancel: &CancelHandle) -> Phase {
        if cancel.is_cancelled() {
            // Handled at the step boundary in the drive loop.
            return Phase::AwaitOracle;
        }

        if history.len() >= self.max_steps {
            return Phase::Fail {
                exhausted: true,
                reason: format!(
                    "step budget of {} exhausted without a final answer",
                    self.max_steps
                ),
            };
        }

        debug!(step = history.len() + 1, "Awaiting oracle");
        let start = Instant::now();
        match self
            .oracle
            .complete(&self.instructions, task, history)
            .await
        {
            Ok(raw) => {
                self.event_bus.publish(DomainEvent::OracleCompleted {
                    task_id: task.id().to_string(),
                    step: history.len() + 1,
                    duration_ms: start.elapsed().as_millis() as u64,
                    timestamp: chrono::Utc::now(),
                });
                Phase::Decode { raw }
            }
            Err(e @ OracleError::RetriesExhausted { .. }) => Phase::Fail {
                exhausted: true,
                reason: e.to_string(),
            },
            Err(e) => Phase::Fail {
                exhausted: false,
                reason: format!("oracle failed: {e}"),
            },
        }
    }

    fn decode(&self, raw: String, history: &mut History) -> Phase {
        match decode_turn(&raw) {
            Intent::Invoke(invocation) => Phase::Invoke { raw, invocation },
            Intent::Final { payload } => Phase::Finalize { raw, payload },
            Intent::Unparseable => match self.on_unparseable {
                UnparseablePolicy::Fail => {
                    let reason = format!(
                        "oracle response did not match the turn grammar: {}",
                        preview(&raw)
                    );
                    history.record(raw, Intent::Unparseable, None);
                    Phase::Fail {
                        exhausted: false,
                        reason,
                    }
                }
                UnparseablePolicy::AcceptAsFinal => {
                    let payload = raw.trim().to_string();
                    Phase::Finalize { raw, payload }
                }
            },
        }
    }

    async fn invoke(
        &self,
        raw: String,
        invocation: Invocation,
        history: &mut History,
    ) -> Phase {
        if self.skip_duplicate_calls && history.has_executed(&invocation) {
            debug!(call = %invocation, "Skipping duplicate invocation");
            let note = Observation::Text(format!(
                "already executed {}; use its earlier result",
                invocation.call_key()
            ));
            history.record(raw, Intent::Invoke(invocation), Some(note));
            return self.next_after_step(history);
        }

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.tool_timeout, self.tools.invoke(&invocation))
            .await
            .unwrap_or_else(|_| {
                Err(ToolError::Timeout {
                    tool: invocation.tool.clone(),
                    timeout_secs: self.tool_timeout.as_secs(),
                })
            });
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(observation) => {
                self.event_bus.publish(DomainEvent::ToolInvoked {
                    tool_name: invocation.tool.clone(),
                    success: true,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                history.record(raw, Intent::Invoke(invocation), Some(observation));
                self.next_after_step(history)
            }
            Err(e) if e.is_recoverable() => {
                // Feed the error back so the oracle can self-correct.
                warn!(call = %invocation, error = %e, "Tool failed recoverably");
                self.event_bus.publish(DomainEvent::ToolInvoked {
                    tool_name: invocation.tool.clone(),
                    success: false,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                let observation = Observation::Text(format!("Error: {e}"));
                history.record(raw, Intent::Invoke(invocation), Some(observation));
                self.next_after_step(history)
            }
            Err(e) => {
                // Unknown tool or arity drift: the oracle broke the declared
                // contract. The handler was never called.
                self.event_bus.publish(DomainEvent::ToolInvoked {
                    tool_name: invocation.tool.clone(),
                    success: false,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });
                history.record(raw, Intent::Invoke(invocation), None);
                Phase::Fail {
                    exhausted: false,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn next_after_step(&self, history: &History) -> Phase {
        if history.len() >= self.max_steps {
            Phase::Fail {
                exhausted: true,
                reason: format!(
                    "step budget of {} exhausted without a final answer",
                    self.max_steps
                ),
            }
        } else {
            Phase::AwaitOracle
        }
    }
}

fn preview(raw: &str) -> String {
    let flat = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return "(empty)".into();
    }
    if flat.chars().count() > 120 {
        let head: String = flat.chars().take(120).collect();
        return format!("'{head}…'");
    }
    format!("'{flat}'")
}

// ── Tests ─────────────────────────────────────────────────────────────────
