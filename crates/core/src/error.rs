//! Error types for the stepline domain.
//!
//! Each bounded context has its own error enum, and each enum knows which
//! of its variants the loop may recover from: oracles classify transient
//! vs fatal, tools classify recoverable vs contract-breaking.

use thiserror::Error;

/// The top-level error type for all stepline operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Oracle errors ---
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Sink errors ---
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for fallible stepline operations.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures raised while obtaining a completion from the oracle.
///
/// Transient variants may be retried by a retry decorator; fatal variants
/// must propagate immediately. `RetriesExhausted` marks a spent retry
/// budget and terminates the loop as `Exhausted`, not `Failure`.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Rate limited by oracle, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Oracle unavailable: {message} (status: {status_code})")]
    Unavailable { status_code: u16, message: String },

    #[error("Oracle request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed oracle request: {0}")]
    MalformedRequest(String),

    #[error("Oracle retry budget exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl OracleError {
    /// Whether a retry decorator may retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::RateLimited { .. }
                | OracleError::Unavailable { .. }
                | OracleError::Timeout(_)
                | OracleError::Network(_)
        )
    }
}

/// Failures raised while resolving or executing a tool.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Arity mismatch for {tool}: expected {expected} argument(s), got {got}")]
    ArityMismatch {
        tool: String,
        expected: usize,
        got: usize,
    },

    #[error("Tool execution failed: {tool} — {reason}")]
    ExecutionFailed { tool: String, reason: String },

    #[error("Tool timed out: {tool} after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },

    #[error("Invalid argument for {tool}.{slot}: {reason}")]
    InvalidArgument {
        tool: String,
        slot: String,
        reason: String,
    },
}

impl ToolError {
    /// Whether the loop may feed this failure back to the oracle as an
    /// observation and continue. `Unknown` and `ArityMismatch` mean the
    /// oracle drifted from the declared tool contract and are terminal;
    /// `Duplicate` is a registration-time programming error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ToolError::ExecutionFailed { .. }
                | ToolError::Timeout { .. }
                | ToolError::InvalidArgument { .. }
        )
    }
}

/// Failures raised while delivering a terminal result.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Delivery failed via {sink}: {reason}")]
    DeliveryFailed { sink: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_error_displays_correctly() {
        let err = Error::Oracle(OracleError::Unavailable {
            status_code: 503,
            message: "overloaded".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn transient_classification() {
        assert!(OracleError::RateLimited { retry_after_secs: 5 }.is_transient());
        assert!(OracleError::Timeout("30s".into()).is_transient());
        assert!(!OracleError::AuthenticationFailed("bad key".into()).is_transient());
        assert!(
            !OracleError::RetriesExhausted {
                attempts: 3,
                last: "rate limited".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn recoverable_classification() {
        assert!(
            ToolError::ExecutionFailed {
                tool: "get_price".into(),
                reason: "connection reset".into()
            }
            .is_recoverable()
        );
        assert!(
            ToolError::Timeout {
                tool: "get_price".into(),
                timeout_secs: 30
            }
            .is_recoverable()
        );
        assert!(!ToolError::Unknown("nonexistent_tool".into()).is_recoverable());
        assert!(
            !ToolError::ArityMismatch {
                tool: "check_answer".into(),
                expected: 2,
                got: 1
            }
            .is_recoverable()
        );
    }

    #[test]
    fn arity_mismatch_displays_counts() {
        let err = ToolError::ArityMismatch {
            tool: "check_answer".into(),
            expected: 2,
            got: 3,
        };
        let text = err.to_string();
        assert!(text.contains("check_answer"));
        assert!(text.contains('2'));
        assert!(text.contains('3'));
    }
}
