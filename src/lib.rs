//! Vigil - Background risk and escalation engine
//!
//! Vigil watches tenant task data for delivery risk. Overdue and at-risk
//! tasks get sticky risk flags that propagate through dependency chains
//! and roll up to campaign status. Flags that stay unresolved escalate to
//! owners and managers on a fixed ladder, and due-date reminders go out
//! as deadlines approach.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure risk rules, models and port traits
//! - **Service Layer** (`services`): Sweep engines and the scheduler daemon
//! - **Adapters** (`adapters`): SQLite persistence and the summary cache
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Campaign, CampaignRisk, Config, DatabaseConfig, EngineConfig, LoggingConfig, ReminderConfig,
    RiskFlag, Task, TaskEvent, TaskEventType, TaskStatus,
};
pub use domain::ports::{
    CacheInvalidator, CampaignRepository, NotificationSink, SweepCoordinator, TaskEventLog,
    TaskRepository, TenantDirectory,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{EngineDaemon, EngineKind, RiskEngine, RunOutcome, RunStats};
