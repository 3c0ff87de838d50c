//! Tracing and logging setup shared by every binary and test that embeds the
//! client core.

/// Subscriber configuration (filters, output format).
pub mod subscriber;

pub use subscriber::{LogFormat, ParseLogFormatError, init, init_for_tests};
