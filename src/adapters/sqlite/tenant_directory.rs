//! SQLite implementation of the read-only tenant directory.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{MemberRole, Organization};
use crate::domain::ports::TenantDirectory;

#[derive(Clone)]
pub struct SqliteTenantDirectory {
    pool: SqlitePool,
}

impl SqliteTenantDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for SqliteTenantDirectory {
    async fn page_after(&self, after: Option<Uuid>, limit: u32) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> = match after {
            Some(after) => {
                sqlx::query_as("SELECT id FROM organizations WHERE id > ? ORDER BY id LIMIT ?")
                    .bind(after.to_string())
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT id FROM organizations ORDER BY id LIMIT ?")
                    .bind(i64::from(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }

    async fn get(&self, org_id: Uuid) -> DomainResult<Option<Organization>> {
        let row: Option<OrganizationRow> =
            sqlx::query_as("SELECT * FROM organizations WHERE id = ?")
                .bind(org_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Organization::try_from).transpose()
    }

    async fn members_by_role(&self, org_id: Uuid, role: MemberRole) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT user_id FROM org_members WHERE org_id = ? AND role = ? ORDER BY user_id",
        )
        .bind(org_id.to_string())
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }
}

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    created_at: String,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = DomainError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Organization {
            id: parse_uuid(&row.id)?,
            name: row.name,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
