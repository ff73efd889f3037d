//! Console sink — renders the terminal result for a terminal user.

use async_trait::async_trait;
use stepline_core::error::SinkError;
use stepline_core::{Outcome, Sink, Task, TerminalResult};

pub struct ConsoleSink;

impl ConsoleSink {
    /// Build the lines printed for a result. Split out so formatting is
    /// testable without capturing stdout.
    pub fn render(task: &Task, result: &TerminalResult) -> String {
        match &result.outcome {
            Outcome::Success { value } => format!(
                "Task: {}\nAnswer: {}\nSteps: {}",
                task.goal(),
                value,
                result.step_count
            ),
            Outcome::Failure { reason } => format!(
                "Task: {}\nFailed: {}\nSteps: {}",
                task.goal(),
                reason,
                result.step_count
            ),
            Outcome::Exhausted { reason } => format!(
                "Task: {}\nGave up: {}\nSteps: {}",
                task.goal(),
                reason,
                result.step_count
            ),
        }
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, task: &Task, result: &TerminalResult) -> Result<(), SinkError> {
        println!("{}", Self::render(task, result));
        Ok(())
    }
}
