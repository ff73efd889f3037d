//! The stepline loop controller.
//!
//! Drives the iterate–call–feed-back cycle between an oracle and a tool
//! registry: ask the oracle for the next turn, decode it, invoke the
//! requested tool, append the observation to the history, repeat — until a
//! final answer, a terminal error, or budget exhaustion. Every run produces
//! exactly one [`stepline_core::TerminalResult`].

pub mod runner;

pub use runner::{LoopRunner, UnparseablePolicy};
