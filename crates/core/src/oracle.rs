//! Oracle trait — the abstraction over the remote reasoning service.
//!
//! An Oracle is asked once per loop iteration for the next step, given the
//! system instructions, the immutable task, and the step history so far.
//! It returns a single raw text completion — possibly empty, never multiple
//! competing candidates.
//!
//! Implementations: HTTP backends, retry decorators, scripted replays.

use crate::error::OracleError;
use crate::step::History;
use crate::task::Task;
use async_trait::async_trait;

/// The core Oracle trait.
///
/// The loop runner calls `complete()` without knowing which backend is in
/// use. Implementations must not mutate shared state; their only side
/// effect is the outbound call itself.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// A human-readable name for this oracle (e.g., "gemini", "scripted").
    fn name(&self) -> &str;

    /// Obtain the next raw turn text for the given task and history.
    async fn complete(
        &self,
        instructions: &str,
        task: &Task,
        history: &History,
    ) -> std::result::Result<String, OracleError>;
}
