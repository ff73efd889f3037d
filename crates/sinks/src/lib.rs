//! Terminal-result sink implementations for stepline.
//!
//! A sink is the loop's single outward callback. Three implementations:
//!
//! - [`ConsoleSink`] — render the outcome for a terminal user
//! - [`MemorySink`] — capture deliveries for tests and embedding callers
//! - [`TelegramSink`] — push the outcome to a Telegram chat

pub mod console;
pub mod memory;
pub mod telegram;

pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use telegram::{TelegramSink, TelegramSinkConfig};
