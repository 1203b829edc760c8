//! SQLite implementation of the sweep coordinator.
//!
//! Locks live in `engine_locks`, one row per engine name. Acquisition is a
//! single conditional upsert so two racing runners resolve on the database's
//! row lock rather than on a read-then-write gap. Cursors live in
//! `engine_cursors` under the same names.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{EngineLock, SweepCoordinator, SweepCursor};

#[derive(Clone)]
pub struct SqliteSweepCoordinator {
    pool: SqlitePool,
    /// Identity of this runner instance. Release only removes rows
    /// carrying this token.
    holder: Uuid,
    /// Page size written into cursors this instance creates or advances.
    page_size: u32,
}

impl SqliteSweepCoordinator {
    pub fn new(pool: SqlitePool, page_size: u32) -> Self {
        Self {
            pool,
            holder: Uuid::new_v4(),
            page_size,
        }
    }

    pub fn holder(&self) -> Uuid {
        self.holder
    }
}

#[async_trait]
impl SweepCoordinator for SqliteSweepCoordinator {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> DomainResult<bool> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| DomainError::ValidationFailed(format!("Lock TTL out of range: {e}")))?;
        let expires_at = now + ttl;

        // The WHERE clause keeps the update from touching a live lock held
        // by someone else; re-acquiring our own lock extends the lease.
        let result = sqlx::query(
            r#"INSERT INTO engine_locks (name, holder, acquired_at, expires_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(name) DO UPDATE SET
                   holder = excluded.holder,
                   acquired_at = excluded.acquired_at,
                   expires_at = excluded.expires_at
               WHERE engine_locks.expires_at <= excluded.acquired_at
                  OR engine_locks.holder = excluded.holder"#,
        )
        .bind(name)
        .bind(self.holder.to_string())
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, name: &str) -> DomainResult<()> {
        sqlx::query("DELETE FROM engine_locks WHERE name = ? AND holder = ?")
            .bind(name)
            .bind(self.holder.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn read_lock(&self, name: &str) -> DomainResult<Option<EngineLock>> {
        let row: Option<LockRow> = sqlx::query_as("SELECT * FROM engine_locks WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(EngineLock::try_from).transpose()
    }

    async fn read_cursor(&self, name: &str) -> DomainResult<SweepCursor> {
        let row: Option<(Option<String>, i64)> =
            sqlx::query_as("SELECT last_org_id, page_size FROM engine_cursors WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((last_org_id, page_size)) => Ok(SweepCursor {
                last_org_id: parse_optional_uuid(last_org_id)?,
                page_size: u32::try_from(page_size).unwrap_or(self.page_size),
            }),
            None => {
                sqlx::query(
                    r#"INSERT INTO engine_cursors (name, last_org_id, page_size, updated_at)
                       VALUES (?, NULL, ?, ?)
                       ON CONFLICT(name) DO NOTHING"#,
                )
                .bind(name)
                .bind(i64::from(self.page_size))
                .bind(Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;

                Ok(SweepCursor {
                    last_org_id: None,
                    page_size: self.page_size,
                })
            }
        }
    }

    async fn advance_cursor(&self, name: &str, last: Option<Uuid>) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO engine_cursors (name, last_org_id, page_size, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(name) DO UPDATE SET
                   last_org_id = excluded.last_org_id,
                   page_size = excluded.page_size,
                   updated_at = excluded.updated_at"#,
        )
        .bind(name)
        .bind(last.map(|id| id.to_string()))
        .bind(i64::from(self.page_size))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct LockRow {
    name: String,
    holder: String,
    acquired_at: String,
    expires_at: String,
}

impl TryFrom<LockRow> for EngineLock {
    type Error = DomainError;

    fn try_from(row: LockRow) -> Result<Self, Self::Error> {
        Ok(EngineLock {
            name: row.name,
            holder: parse_uuid(&row.holder)?,
            acquired_at: parse_datetime(&row.acquired_at)?,
            expires_at: parse_datetime(&row.expires_at)?,
        })
    }
}
