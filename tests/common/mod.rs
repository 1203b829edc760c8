//! Shared fixtures for the integration tests.
//!
//! Orgs and members are seeded with raw SQL because the engine's ports only
//! read them; campaigns and tasks go through the real repositories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use vigil::adapters::cache::RiskSummaryCache;
use vigil::adapters::sqlite::{
    create_migrated_test_pool, SqliteCampaignRepository, SqliteNotificationSink,
    SqliteSweepCoordinator, SqliteTaskEventLog, SqliteTaskRepository, SqliteTenantDirectory,
};
use vigil::domain::models::{Campaign, EngineConfig, MemberRole, OrgMember, ReminderConfig, Task};
use vigil::domain::ports::{CampaignRepository, TaskRepository};
use vigil::services::RiskEngine;

/// In-memory pool with the full schema applied.
pub async fn setup_pool() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test pool")
}

/// Engine wired onto the pool with default config and the given page size.
#[allow(dead_code)]
pub fn engine_with_page_size(pool: &SqlitePool, page_size: u32) -> RiskEngine {
    RiskEngine::new(
        Arc::new(SqliteTaskRepository::new(pool.clone())),
        Arc::new(SqliteCampaignRepository::new(pool.clone())),
        Arc::new(SqliteTaskEventLog::new(pool.clone())),
        Arc::new(SqliteTenantDirectory::new(pool.clone())),
        Arc::new(SqliteSweepCoordinator::new(pool.clone(), page_size)),
        Arc::new(SqliteNotificationSink::new(pool.clone())),
        Arc::new(RiskSummaryCache::new()),
        EngineConfig::default(),
        ReminderConfig::default(),
    )
}

/// Engine wired onto the pool with default config.
#[allow(dead_code)]
pub fn engine(pool: &SqlitePool) -> RiskEngine {
    engine_with_page_size(pool, 50)
}

#[allow(dead_code)]
pub async fn seed_org(pool: &SqlitePool, name: &str) -> Uuid {
    let org_id = Uuid::new_v4();
    sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES (?, ?, ?)")
        .bind(org_id.to_string())
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .expect("failed to insert organization");
    org_id
}

#[allow(dead_code)]
pub async fn seed_member(pool: &SqlitePool, org_id: Uuid, role: &str) -> Uuid {
    let member = OrgMember {
        org_id,
        user_id: Uuid::new_v4(),
        role: MemberRole::from_str(role).expect("unknown role"),
    };
    sqlx::query("INSERT INTO org_members (org_id, user_id, role) VALUES (?, ?, ?)")
        .bind(member.org_id.to_string())
        .bind(member.user_id.to_string())
        .bind(member.role.as_str())
        .execute(pool)
        .await
        .expect("failed to insert member");
    member.user_id
}

#[allow(dead_code)]
pub async fn seed_campaign(
    pool: &SqlitePool,
    org_id: Uuid,
    name: &str,
    launch_date: DateTime<Utc>,
) -> Campaign {
    let campaign = Campaign::new(org_id, name, launch_date);
    SqliteCampaignRepository::new(pool.clone())
        .insert(&campaign)
        .await
        .expect("failed to insert campaign");
    campaign
}

#[allow(dead_code)]
pub async fn seed_task(pool: &SqlitePool, task: &Task) {
    SqliteTaskRepository::new(pool.clone())
        .insert(task)
        .await
        .expect("failed to insert task");
}

/// Stored risk flag of a task, straight from the column.
#[allow(dead_code)]
pub async fn stored_flag(pool: &SqlitePool, task_id: Uuid) -> String {
    sqlx::query_scalar("SELECT risk_flag FROM tasks WHERE id = ?")
        .bind(task_id.to_string())
        .fetch_one(pool)
        .await
        .expect("failed to read risk flag")
}

/// Stored risk status of a campaign.
#[allow(dead_code)]
pub async fn stored_campaign_status(pool: &SqlitePool, campaign_id: Uuid) -> String {
    sqlx::query_scalar("SELECT risk_status FROM campaigns WHERE id = ?")
        .bind(campaign_id.to_string())
        .fetch_one(pool)
        .await
        .expect("failed to read campaign status")
}

/// Count of events of one type for one task.
#[allow(dead_code)]
pub async fn count_events(pool: &SqlitePool, task_id: Uuid, event_type: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM task_events WHERE task_id = ? AND event_type = ?")
        .bind(task_id.to_string())
        .bind(event_type)
        .fetch_one(pool)
        .await
        .expect("failed to count events")
}

/// Count of stored notifications of one kind.
#[allow(dead_code)]
pub async fn count_notifications(pool: &SqlitePool, kind: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE kind = ?")
        .bind(kind)
        .fetch_one(pool)
        .await
        .expect("failed to count notifications")
}
