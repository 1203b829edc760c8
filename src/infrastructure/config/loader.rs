use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid {0}: must be positive")]
    ZeroInterval(&'static str),

    #[error("Invalid tenant_page_size: {0}. Must be between 1 and 1000")]
    InvalidPageSize(u32),

    #[error("Invalid max_concurrent_tenants: {0}. Must be between 1 and 64")]
    InvalidConcurrency(usize),

    #[error("Invalid max_consecutive_failures: {0}. Cannot be 0")]
    InvalidMaxFailures(u32),

    #[error("Invalid day-out reminder window: start {0}h must be below end {1}h, both positive")]
    InvalidUpcomingWindow(i64, i64),

    #[error("Invalid due-day reminder window: start hour {0} must be below end hour {1}, at most 23")]
    InvalidDueDayWindow(u32, u32),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .vigil/config.yaml (project config, created by init)
    /// 3. .vigil/local.yaml (project local overrides, optional)
    /// 4. Environment variables (VIGIL_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".vigil/config.yaml"))
            .merge(Yaml::file(".vigil/local.yaml"))
            .merge(Env::prefixed("VIGIL_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let engine = &config.engine;
        for (name, value) in [
            ("risk_interval_secs", engine.risk_interval_secs),
            ("risk_lock_ttl_secs", engine.risk_lock_ttl_secs),
            ("reminder_interval_secs", engine.reminder_interval_secs),
            ("reminder_lock_ttl_secs", engine.reminder_lock_ttl_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }

        if engine.tenant_page_size == 0 || engine.tenant_page_size > 1000 {
            return Err(ConfigError::InvalidPageSize(engine.tenant_page_size));
        }

        if engine.max_concurrent_tenants == 0 || engine.max_concurrent_tenants > 64 {
            return Err(ConfigError::InvalidConcurrency(engine.max_concurrent_tenants));
        }

        if engine.max_consecutive_failures == 0 {
            return Err(ConfigError::InvalidMaxFailures(engine.max_consecutive_failures));
        }

        let reminders = &config.reminders;
        if reminders.upcoming_window_start_hours <= 0
            || reminders.upcoming_window_start_hours >= reminders.upcoming_window_end_hours
        {
            return Err(ConfigError::InvalidUpcomingWindow(
                reminders.upcoming_window_start_hours,
                reminders.upcoming_window_end_hours,
            ));
        }

        if reminders.due_day_start_hour >= reminders.due_day_end_hour
            || reminders.due_day_end_hour > 23
        {
            return Err(ConfigError::InvalidDueDayWindow(
                reminders.due_day_start_hour,
                reminders.due_day_end_hour,
            ));
        }

        Ok(())
    }
}
