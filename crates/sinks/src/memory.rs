//! In-memory sink — captures deliveries behind a mutex.
//!
//! Useful in tests and for callers that embed the loop and want the
//! results programmatically rather than rendered.

use async_trait::async_trait;
use std::sync::Mutex;
use stepline_core::error::SinkError;
use stepline_core::{Sink, Task, TerminalResult};

#[derive(Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<(String, TerminalResult)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All (task goal, result) pairs delivered so far.
    pub fn delivered(&self) -> Vec<(String, TerminalResult)> {
        self.delivered.lock().expect("sink mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().expect("sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, task: &Task, result: &TerminalResult) -> Result<(), SinkError> {
        self.delivered
            .lock()
            .map_err(|_| SinkError::DeliveryFailed {
                sink: "memory".into(),
                reason: "sink mutex poisoned".into(),
            })?
            .push((task.goal().to_string(), result.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_deliveries_in_order() {
        let sink = MemorySink::new();
        let task = Task::new("first");
        sink.deliver(&task, &TerminalResult::success("1", 1))
            .await
            .unwrap();
        sink.deliver(&Task::new("second"), &TerminalResult::failure("broke", 0))
            .await
            .unwrap();

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].0, "first");
        assert!(delivered[0].1.is_success());
        assert!(!delivered[1].1.is_success());
    }
}
