//! Cached per-tenant risk summaries with sweep-driven invalidation.
//!
//! Summaries back the product's dashboard reads and the `status` command.
//! Entries expire on a short TTL and are additionally dropped by the engine
//! through the [`CacheInvalidator`] port when a sweep changed the tenant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::ports::CacheInvalidator;

/// Default TTL for cached summaries.
const SUMMARY_CACHE_TTL_SECS: u64 = 60;

/// Maximum number of cached tenant entries.
const SUMMARY_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Flag and campaign counts for one tenant at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRiskSummary {
    pub org_id: Uuid,
    pub soft_flagged: usize,
    pub hard_flagged: usize,
    pub campaigns_at_risk: usize,
    pub campaigns_high_risk: usize,
    pub computed_at: DateTime<Utc>,
}

pub struct RiskSummaryCache {
    by_org: Cache<Uuid, Arc<OrgRiskSummary>>,
}

impl RiskSummaryCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(SUMMARY_CACHE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let by_org = Cache::builder()
            .max_capacity(SUMMARY_CACHE_MAX_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { by_org }
    }

    pub async fn get(&self, org_id: Uuid) -> Option<Arc<OrgRiskSummary>> {
        self.by_org.get(&org_id).await
    }

    pub async fn insert(&self, summary: OrgRiskSummary) {
        self.by_org.insert(summary.org_id, Arc::new(summary)).await;
    }
}

impl Default for RiskSummaryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheInvalidator for RiskSummaryCache {
    async fn invalidate(&self, org_id: Uuid) {
        self.by_org.invalidate(&org_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(org_id: Uuid) -> OrgRiskSummary {
        OrgRiskSummary {
            org_id,
            soft_flagged: 2,
            hard_flagged: 1,
            campaigns_at_risk: 1,
            campaigns_high_risk: 0,
            computed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn invalidate_drops_only_the_named_tenant() {
        let cache = RiskSummaryCache::new();
        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();

        cache.insert(summary(org_a)).await;
        cache.insert(summary(org_b)).await;

        cache.invalidate(org_a).await;

        assert!(cache.get(org_a).await.is_none());
        assert!(cache.get(org_b).await.is_some());
    }

    #[tokio::test]
    async fn entries_round_trip() {
        let cache = RiskSummaryCache::new();
        let org_id = Uuid::new_v4();
        cache.insert(summary(org_id)).await;

        let cached = cache.get(org_id).await.unwrap();
        assert_eq!(cached.org_id, org_id);
        assert_eq!(cached.hard_flagged, 1);
    }
}
