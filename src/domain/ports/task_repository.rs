use crate::domain::errors::DomainResult;
use crate::domain::models::{RiskFlag, Task, TaskStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository port for task persistence operations
///
/// The engine reads whole tenants at a time and writes nothing but the risk
/// flag; status writes exist for the surrounding mutation boundary and for
/// fixtures.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn insert(&self, task: &Task) -> DomainResult<()>;

    /// Get a task by ID within a tenant
    async fn get(&self, org_id: Uuid, task_id: Uuid) -> DomainResult<Option<Task>>;

    /// All tasks of a tenant, completed included, in stable id order.
    /// The propagator needs completed ancestors to walk through.
    async fn list_by_org(&self, org_id: Uuid) -> DomainResult<Vec<Task>>;

    /// Update lifecycle status and the updated_at timestamp
    async fn update_status(&self, org_id: Uuid, task_id: Uuid, status: TaskStatus)
        -> DomainResult<()>;

    /// Update the risk flag and the updated_at timestamp.
    /// Errors with `TaskNotFound` when no row matched.
    async fn set_risk_flag(&self, org_id: Uuid, task_id: Uuid, flag: RiskFlag) -> DomainResult<()>;
}
