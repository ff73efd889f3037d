//! Retry decorator — bounded retries with per-attempt timeouts.
//!
//! Wraps any oracle. Transient failures (rate limit, unavailable, network,
//! timeout) are retried up to a fixed attempt budget with doubling backoff;
//! fatal failures (authentication, malformed request) propagate
//! immediately. A spent budget surfaces `RetriesExhausted`, which the loop
//! must treat as terminal — never an infinite retry.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stepline_core::error::OracleError;
use stepline_core::{History, Oracle, Task};
use tracing::{info, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// An oracle that retries a wrapped oracle on transient failure.
pub struct RetryOracle {
    name: String,
    inner: Arc<dyn Oracle>,
    max_attempts: u32,
    backoff: Duration,
    attempt_timeout: Duration,
}

impl RetryOracle {
    pub fn new(inner: Arc<dyn Oracle>) -> Self {
        Self {
            name: "retry".into(),
            inner,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Set the attempt budget (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the initial backoff; each retry doubles it.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the per-attempt timeout. An elapsed timeout counts as a
    /// transient failure against the budget.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

#[async_trait]
impl Oracle for RetryOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        instructions: &str,
        task: &Task,
        history: &History,
    ) -> Result<String, OracleError> {
        let mut last_error = OracleError::Network("no attempts made".into());
        let mut backoff = self.backoff;

        for attempt in 1..=self.max_attempts {
            let call = self.inner.complete(instructions, task, history);
            match tokio::time::timeout(self.attempt_timeout, call).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) if e.is_transient() => {
                    warn!(
                        oracle = self.inner.name(),
                        attempt,
                        max = self.max_attempts,
                        error = %e,
                        "Transient oracle failure"
                    );
                    last_error = e;
                }
                Ok(Err(fatal)) => return Err(fatal),
                Err(_) => {
                    warn!(
                        oracle = self.inner.name(),
                        attempt,
                        timeout_secs = self.attempt_timeout.as_secs(),
                        "Oracle attempt timed out"
                    );
                    last_error = OracleError::Timeout(format!(
                        "attempt timed out after {}s",
                        self.attempt_timeout.as_secs()
                    ));
                }
            }

            if attempt < self.max_attempts {
                info!(delay_ms = backoff.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(OracleError::RetriesExhausted {
            attempts: self.max_attempts,
            last: last_error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails with a given transient error a fixed number of times, then
    /// succeeds. Counts outbound calls.
    struct FlakyOracle {
        failures: Mutex<u32>,
        error: OracleError,
        calls: Mutex<u32>,
    }

    impl FlakyOracle {
        fn new(failures: u32, error: OracleError) -> Self {
            Self {
                failures: Mutex::new(failures),
                error,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Oracle for FlakyOracle {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _instructions: &str,
            _task: &Task,
            _history: &History,
        ) -> Result<String, OracleError> {
            *self.calls.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(self.error.clone());
            }
            Ok("FINAL_ANSWER: [ok]".into())
        }
    }

    /// Hangs forever (for timeout testing).
    struct HangingOracle;

    #[async_trait]
    impl Oracle for HangingOracle {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _instructions: &str,
            _task: &Task,
            _history: &History,
        ) -> Result<String, OracleError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn fixture() -> (Task, History) {
        (Task::new("test task"), History::new())
    }

    #[tokio::test]
    async fn transient_failures_then_success_makes_exactly_n_calls() {
        // Fails transiently N-1 = 2 times, succeeds on the 3rd attempt.
        let inner = Arc::new(FlakyOracle::new(
            2,
            OracleError::RateLimited { retry_after_secs: 1 },
        ));
        let oracle = RetryOracle::new(inner.clone())
            .with_max_attempts(3)
            .with_backoff(Duration::from_millis(1));

        let (task, history) = fixture();
        let text = oracle.complete("sys", &task, &history).await.unwrap();
        assert_eq!(text, "FINAL_ANSWER: [ok]");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let inner = Arc::new(FlakyOracle::new(
            5,
            OracleError::AuthenticationFailed("bad key".into()),
        ));
        let oracle = RetryOracle::new(inner.clone())
            .with_max_attempts(3)
            .with_backoff(Duration::from_millis(1));

        let (task, history) = fixture();
        let err = oracle.complete("sys", &task, &history).await.unwrap_err();
        assert!(matches!(err, OracleError::AuthenticationFailed(_)));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn budget_exhaustion_surfaces_retries_exhausted() {
        let inner = Arc::new(FlakyOracle::new(
            10,
            OracleError::Unavailable {
                status_code: 503,
                message: "overloaded".into(),
            },
        ));
        let oracle = RetryOracle::new(inner.clone())
            .with_max_attempts(3)
            .with_backoff(Duration::from_millis(1));

        let (task, history) = fixture();
        let err = oracle.complete("sys", &task, &history).await.unwrap_err();
        match err {
            OracleError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("overloaded"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn attempt_timeout_counts_as_transient() {
        let oracle = RetryOracle::new(Arc::new(HangingOracle))
            .with_max_attempts(2)
            .with_backoff(Duration::from_millis(1))
            .with_attempt_timeout(Duration::from_millis(20));

        let (task, history) = fixture();
        let err = oracle.complete("sys", &task, &history).await.unwrap_err();
        match err {
            OracleError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.contains("timed out"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }
}
