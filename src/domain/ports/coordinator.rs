use std::time::Duration;

use crate::domain::errors::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A held (or lapsed) sweep lock, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineLock {
    /// Engine name, e.g. "risk_engine"
    pub name: String,
    /// Token of the runner instance holding the lock
    pub holder: Uuid,
    /// When the lock was taken
    pub acquired_at: DateTime<Utc>,
    /// When a stalled holder may be displaced
    pub expires_at: DateTime<Utc>,
}

impl EngineLock {
    /// Whether the lock can be taken over.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Pagination position of one engine's tenant sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepCursor {
    /// Last organization id processed; `None` means start from the top
    pub last_org_id: Option<Uuid>,
    /// Organizations per sweep run
    pub page_size: u32,
}

/// Port coordinating sweep runs across engine instances
///
/// One logical engine (risk, reminders) maps to one lock name and one
/// cursor name. Acquisition must be a single conditional write so that two
/// racing runners cannot both see themselves as the holder; takeover is
/// only legal once the previous holder's TTL has lapsed.
#[async_trait]
pub trait SweepCoordinator: Send + Sync {
    /// Try to take the named lock for `ttl`. `false` means another live
    /// runner holds it and this run should skip.
    async fn try_acquire(&self, name: &str, ttl: Duration) -> DomainResult<bool>;

    /// Release the named lock if this instance holds it. Releasing a lock
    /// another instance took over is a no-op.
    async fn release(&self, name: &str) -> DomainResult<()>;

    /// Current lock row, if any. Read-only, for the operator status view.
    async fn read_lock(&self, name: &str) -> DomainResult<Option<EngineLock>>;

    /// Current cursor for the named engine, creating the initial position
    /// when none is stored yet.
    async fn read_cursor(&self, name: &str) -> DomainResult<SweepCursor>;

    /// Move the cursor. `Some(id)` records the last processed org;
    /// `None` resets to the beginning (wrap-around after a short page).
    async fn advance_cursor(&self, name: &str, last: Option<Uuid>) -> DomainResult<()>;
}
