//! Oracle client implementations for stepline.
//!
//! - [`GeminiOracle`] — HTTP backend for the Gemini `generateContent` API
//! - [`RetryOracle`] — decorator adding per-attempt timeouts and a bounded
//!   retry budget for transient failures
//! - [`ScriptedOracle`] — deterministic replay of a fixed turn list, for
//!   tests and offline runs

pub mod gemini;
pub mod retry;
pub mod scripted;

pub use gemini::GeminiOracle;
pub use retry::RetryOracle;
pub use scripted::ScriptedOracle;
