use serde::{Deserialize, Serialize};

/// Main configuration structure for Vigil
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sweep engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Reminder window configuration
    #[serde(default)]
    pub reminders: ReminderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            engine: EngineConfig::default(),
            reminders: ReminderConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".vigil/vigil.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl DatabaseConfig {
    /// SQLite connection URL for the configured path.
    pub fn database_url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub dir: Option<std::path::PathBuf>,

    /// Number of days to retain log files
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: None,
            retention_days: default_retention_days(),
        }
    }
}

/// Sweep engine configuration
///
/// Lock TTLs must stay shorter than the matching run intervals so a crashed
/// runner's lock lapses before the next scheduled run needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Seconds between risk sweeps in daemon mode
    #[serde(default = "default_risk_interval_secs")]
    pub risk_interval_secs: u64,

    /// Lock TTL for the risk sweep
    #[serde(default = "default_risk_lock_ttl_secs")]
    pub risk_lock_ttl_secs: u64,

    /// Seconds between reminder sweeps in daemon mode
    #[serde(default = "default_reminder_interval_secs")]
    pub reminder_interval_secs: u64,

    /// Lock TTL for the reminder sweep
    #[serde(default = "default_reminder_lock_ttl_secs")]
    pub reminder_lock_ttl_secs: u64,

    /// Organizations fetched per cursor page
    #[serde(default = "default_tenant_page_size")]
    pub tenant_page_size: u32,

    /// Maximum organizations processed concurrently within a sweep
    #[serde(default = "default_max_concurrent_tenants")]
    pub max_concurrent_tenants: usize,

    /// Consecutive daemon cycle failures before giving up
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

const fn default_risk_interval_secs() -> u64 {
    3600
}

const fn default_risk_lock_ttl_secs() -> u64 {
    3300
}

const fn default_reminder_interval_secs() -> u64 {
    1800
}

const fn default_reminder_lock_ttl_secs() -> u64 {
    1500
}

const fn default_tenant_page_size() -> u32 {
    50
}

const fn default_max_concurrent_tenants() -> usize {
    8
}

const fn default_max_consecutive_failures() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_interval_secs: default_risk_interval_secs(),
            risk_lock_ttl_secs: default_risk_lock_ttl_secs(),
            reminder_interval_secs: default_reminder_interval_secs(),
            reminder_lock_ttl_secs: default_reminder_lock_ttl_secs(),
            tenant_page_size: default_tenant_page_size(),
            max_concurrent_tenants: default_max_concurrent_tenants(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Reminder window configuration
///
/// Bounds are hours relative to the due date (for the day-out reminder) or
/// UTC clock hours (for the due-day morning window).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReminderConfig {
    /// Lower bound of the day-out window, hours before due
    #[serde(default = "default_upcoming_window_start_hours")]
    pub upcoming_window_start_hours: i64,

    /// Upper bound of the day-out window, hours before due
    #[serde(default = "default_upcoming_window_end_hours")]
    pub upcoming_window_end_hours: i64,

    /// UTC hour the due-day window opens
    #[serde(default = "default_due_day_start_hour")]
    pub due_day_start_hour: u32,

    /// UTC hour the due-day window closes
    #[serde(default = "default_due_day_end_hour")]
    pub due_day_end_hour: u32,
}

const fn default_upcoming_window_start_hours() -> i64 {
    23
}

const fn default_upcoming_window_end_hours() -> i64 {
    25
}

const fn default_due_day_start_hour() -> u32 {
    7
}

const fn default_due_day_end_hour() -> u32 {
    9
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            upcoming_window_start_hours: default_upcoming_window_start_hours(),
            upcoming_window_end_hours: default_upcoming_window_end_hours(),
            due_day_start_hour: default_due_day_start_hour(),
            due_day_end_hour: default_due_day_end_hour(),
        }
    }
}
