//! Scripted oracle — deterministic replay of a fixed turn list.
//!
//! Each `complete` call returns the next turn in the script. Useful for
//! tests and offline runs where a loop must be exercised without a remote
//! service. With `looping` enabled the last turn repeats forever, which is
//! how budget-exhaustion behavior is exercised.

use async_trait::async_trait;
use std::sync::Mutex;
use stepline_core::error::OracleError;
use stepline_core::{History, Oracle, Task};

/// An oracle that replays a fixed sequence of turns.
pub struct ScriptedOracle {
    turns: Vec<String>,
    cursor: Mutex<usize>,
    looping: bool,
}

impl ScriptedOracle {
    /// Replay the given turns in order. Once the script runs out, further
    /// calls fail with a network error (scripts are expected to cover the
    /// whole run).
    pub fn new(turns: Vec<String>) -> Self {
        Self {
            turns,
            cursor: Mutex::new(0),
            looping: false,
        }
    }

    /// Replay a single turn forever.
    pub fn looping(turn: impl Into<String>) -> Self {
        Self {
            turns: vec![turn.into()],
            cursor: Mutex::new(0),
            looping: true,
        }
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        *self.cursor.lock().unwrap()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _instructions: &str,
        _task: &Task,
        _history: &History,
    ) -> Result<String, OracleError> {
        let mut cursor = self.cursor.lock().unwrap();
        let index = *cursor;
        *cursor += 1;

        if index < self.turns.len() {
            return Ok(self.turns[index].clone());
        }
        if self.looping {
            if let Some(last) = self.turns.last() {
                return Ok(last.clone());
            }
        }
        Err(OracleError::Network(format!(
            "script exhausted after {} turn(s)",
            self.turns.len()
        )))
    }
}
