use async_trait::async_trait;
use uuid::Uuid;

/// Port for dropping derived read caches after a sweep changed state
///
/// Called once per tenant per run, and only when something actually
/// changed. Implementations must be cheap and must not fail the sweep.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate everything cached for the organization
    async fn invalidate(&self, org_id: Uuid);
}
