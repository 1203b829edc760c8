use crate::domain::errors::DomainResult;
use crate::domain::models::TaskEvent;
use async_trait::async_trait;
use uuid::Uuid;

/// Port for the append-only task event log
///
/// Rows are never updated or deleted. All temporal reasoning (blocked-since,
/// dependency completion age, escalation and reminder cooldowns) reads from
/// here, so appends must land before dependent side effects.
#[async_trait]
pub trait TaskEventLog: Send + Sync {
    /// Append one event
    async fn append(&self, event: &TaskEvent) -> DomainResult<()>;

    /// All events of a tenant ordered by recorded_at ascending
    async fn list_by_org(&self, org_id: Uuid) -> DomainResult<Vec<TaskEvent>>;

    /// All events of one task ordered by recorded_at ascending
    async fn list_by_task(&self, org_id: Uuid, task_id: Uuid) -> DomainResult<Vec<TaskEvent>>;
}
