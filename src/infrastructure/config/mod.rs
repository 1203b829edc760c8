//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment: programmatic defaults,
//! `.vigil/` YAML files, then `VIGIL_*` environment overrides, validated
//! into type-safe config structs.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
