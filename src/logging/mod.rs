//! Structured logging setup.

mod format;

pub use format::{DetectionLogEvent, StructuredLogger};
