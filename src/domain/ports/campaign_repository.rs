use crate::domain::errors::DomainResult;
use crate::domain::models::{Campaign, CampaignRisk};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository port for campaign persistence operations
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Insert a new campaign
    async fn insert(&self, campaign: &Campaign) -> DomainResult<()>;

    /// Get a campaign by ID within a tenant
    async fn get(&self, org_id: Uuid, campaign_id: Uuid) -> DomainResult<Option<Campaign>>;

    /// All campaigns of a tenant
    async fn list_by_org(&self, org_id: Uuid) -> DomainResult<Vec<Campaign>>;

    /// Update the derived risk status and the updated_at timestamp.
    /// Errors with `CampaignNotFound` when no row matched.
    async fn set_risk_status(
        &self,
        org_id: Uuid,
        campaign_id: Uuid,
        status: CampaignRisk,
    ) -> DomainResult<()>;

    /// Campaigns currently at risk across all tenants, worst first.
    /// Backs the operator status view.
    async fn list_flagged(&self, limit: u32) -> DomainResult<Vec<Campaign>>;
}
