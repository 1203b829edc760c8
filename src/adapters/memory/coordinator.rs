//! In-memory sweep coordinator.
//!
//! Process-local stand-in for the SQLite coordinator, for tests and for
//! single-process deployments with no shared lock table. Follows the same
//! contract: takeover only after the previous holder's TTL has lapsed,
//! release only removes this instance's own lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{EngineLock, SweepCoordinator, SweepCursor};

/// Sweep coordinator backed by process-local maps.
///
/// Clones share state, so one instance can be handed to several engines
/// in a test while still arbitrating between them. Distinct instances
/// model distinct runners, each with its own holder token.
#[derive(Clone)]
pub struct InMemorySweepCoordinator {
    locks: Arc<RwLock<HashMap<String, EngineLock>>>,
    cursors: Arc<RwLock<HashMap<String, SweepCursor>>>,
    holder: Uuid,
    page_size: u32,
}

impl InMemorySweepCoordinator {
    pub fn new(page_size: u32) -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
            cursors: Arc::new(RwLock::new(HashMap::new())),
            holder: Uuid::new_v4(),
            page_size,
        }
    }

    /// A second runner over the same lock and cursor state.
    pub fn sibling(&self) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
            cursors: Arc::clone(&self.cursors),
            holder: Uuid::new_v4(),
            page_size: self.page_size,
        }
    }

    pub fn holder(&self) -> Uuid {
        self.holder
    }
}

impl Default for InMemorySweepCoordinator {
    fn default() -> Self {
        Self::new(50)
    }
}

#[async_trait]
impl SweepCoordinator for InMemorySweepCoordinator {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> DomainResult<bool> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| DomainError::ValidationFailed(format!("Lock TTL out of range: {e}")))?;

        // Single write-lock section stands in for the database's row lock.
        let mut locks = self.locks.write().await;
        if let Some(existing) = locks.get(name) {
            if existing.holder != self.holder && !existing.is_expired(now) {
                return Ok(false);
            }
        }
        locks.insert(
            name.to_string(),
            EngineLock {
                name: name.to_string(),
                holder: self.holder,
                acquired_at: now,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release(&self, name: &str) -> DomainResult<()> {
        let mut locks = self.locks.write().await;
        if locks.get(name).is_some_and(|lock| lock.holder == self.holder) {
            locks.remove(name);
        }
        Ok(())
    }

    async fn read_lock(&self, name: &str) -> DomainResult<Option<EngineLock>> {
        Ok(self.locks.read().await.get(name).cloned())
    }

    async fn read_cursor(&self, name: &str) -> DomainResult<SweepCursor> {
        let mut cursors = self.cursors.write().await;
        Ok(*cursors.entry(name.to_string()).or_insert(SweepCursor {
            last_org_id: None,
            page_size: self.page_size,
        }))
    }

    async fn advance_cursor(&self, name: &str, last: Option<Uuid>) -> DomainResult<()> {
        let mut cursors = self.cursors.write().await;
        cursors.insert(
            name.to_string(),
            SweepCursor {
                last_org_id: last,
                page_size: self.page_size,
            },
        );
        Ok(())
    }
}
