//! Sink trait — delivery of terminal results to the calling context.
//!
//! A sink is the loop's single outward callback: render in a terminal,
//! capture in memory, push a notification. Side effects are the entire
//! purpose here, but from the loop's perspective a sink is just
//! `deliver(task, result)`.

use crate::error::SinkError;
use crate::step::TerminalResult;
use crate::task::Task;
use async_trait::async_trait;

/// The core Sink trait.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Human-readable sink name (e.g., "console", "telegram").
    fn name(&self) -> &str;

    /// Deliver the terminal result of a task execution.
    async fn deliver(
        &self,
        task: &Task,
        result: &TerminalResult,
    ) -> std::result::Result<(), SinkError>;
}
