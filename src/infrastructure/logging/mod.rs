//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty formatting on stderr
//! - Optional daily-rolling file output
//! - Retention-based cleanup of old log files

pub mod logger;

pub use logger::Logger;
