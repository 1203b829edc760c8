//! Infrastructure layer module
//!
//! Cross-cutting concerns that sit outside the domain:
//! - Configuration loading and validation
//! - Logging setup
//!
//! Database access lives under `adapters::sqlite`; infrastructure here is
//! what wires a process together before any adapter runs.

pub mod config;
pub mod logging;
