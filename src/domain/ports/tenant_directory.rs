use crate::domain::errors::DomainResult;
use crate::domain::models::{MemberRole, Organization};
use async_trait::async_trait;
use uuid::Uuid;

/// Read-only port over the organization directory
///
/// Tenant rows are owned by the surrounding product; the engine only pages
/// through them and resolves escalation audiences.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Organization ids strictly after `after` in stable id order,
    /// at most `limit` of them. `None` starts from the beginning.
    async fn page_after(&self, after: Option<Uuid>, limit: u32) -> DomainResult<Vec<Uuid>>;

    /// Get one organization
    async fn get(&self, org_id: Uuid) -> DomainResult<Option<Organization>>;

    /// User ids holding the given role in the organization
    async fn members_by_role(&self, org_id: Uuid, role: MemberRole) -> DomainResult<Vec<Uuid>>;
}
