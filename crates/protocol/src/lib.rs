//! The stepline oracle protocol.
//!
//! One turn of oracle output is exactly one of two literal line forms:
//!
//! ```text
//! FUNCTION_CALL: tool_name|arg1|arg2
//! FINAL_ANSWER: [payload]
//! ```
//!
//! [`parse`] decodes raw oracle text into an [`stepline_core::Intent`] —
//! strictly, with no best-effort recovery. [`prompt`] renders the other
//! direction: the system instructions that teach the oracle the two forms,
//! and the task transcript that feeds tool observations back.

pub mod parse;
pub mod prompt;

pub use parse::decode_turn;
pub use prompt::{render_prompt, system_instructions};
