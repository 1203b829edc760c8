//! CLI command implementations.

pub mod daemon;
pub mod init;
pub mod status;
pub mod sweep;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::adapters::cache::RiskSummaryCache;
use crate::adapters::sqlite::{
    SqliteCampaignRepository, SqliteNotificationSink, SqliteSweepCoordinator, SqliteTaskEventLog,
    SqliteTaskRepository, SqliteTenantDirectory,
};
use crate::domain::models::Config;
use crate::services::RiskEngine;

/// Wire a fully adapted engine onto one database pool.
pub(crate) fn build_engine(pool: &SqlitePool, config: &Config) -> RiskEngine {
    RiskEngine::new(
        Arc::new(SqliteTaskRepository::new(pool.clone())),
        Arc::new(SqliteCampaignRepository::new(pool.clone())),
        Arc::new(SqliteTaskEventLog::new(pool.clone())),
        Arc::new(SqliteTenantDirectory::new(pool.clone())),
        Arc::new(SqliteSweepCoordinator::new(
            pool.clone(),
            config.engine.tenant_page_size,
        )),
        Arc::new(SqliteNotificationSink::new(pool.clone())),
        Arc::new(RiskSummaryCache::new()),
        config.engine.clone(),
        config.reminders.clone(),
    )
}
