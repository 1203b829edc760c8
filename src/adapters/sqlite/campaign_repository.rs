//! SQLite implementation of the CampaignRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Campaign, CampaignRisk};
use crate::domain::ports::CampaignRepository;

#[derive(Clone)]
pub struct SqliteCampaignRepository {
    pool: SqlitePool,
}

impl SqliteCampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for SqliteCampaignRepository {
    async fn insert(&self, campaign: &Campaign) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO campaigns (id, org_id, name, launch_date, risk_status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(campaign.id.to_string())
        .bind(campaign.org_id.to_string())
        .bind(&campaign.name)
        .bind(campaign.launch_date.to_rfc3339())
        .bind(campaign.risk_status.as_str())
        .bind(campaign.created_at.to_rfc3339())
        .bind(campaign.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, org_id: Uuid, campaign_id: Uuid) -> DomainResult<Option<Campaign>> {
        let row: Option<CampaignRow> =
            sqlx::query_as("SELECT * FROM campaigns WHERE org_id = ? AND id = ?")
                .bind(org_id.to_string())
                .bind(campaign_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Campaign::try_from).transpose()
    }

    async fn list_by_org(&self, org_id: Uuid) -> DomainResult<Vec<Campaign>> {
        let rows: Vec<CampaignRow> =
            sqlx::query_as("SELECT * FROM campaigns WHERE org_id = ? ORDER BY id")
                .bind(org_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn set_risk_status(
        &self,
        org_id: Uuid,
        campaign_id: Uuid,
        status: CampaignRisk,
    ) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE campaigns SET risk_status = ?, updated_at = ? WHERE org_id = ? AND id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(org_id.to_string())
        .bind(campaign_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::CampaignNotFound(campaign_id));
        }

        Ok(())
    }

    async fn list_flagged(&self, limit: u32) -> DomainResult<Vec<Campaign>> {
        let rows: Vec<CampaignRow> = sqlx::query_as(
            r#"SELECT * FROM campaigns WHERE risk_status != 'normal'
               ORDER BY CASE risk_status
                   WHEN 'high_risk' THEN 1
                   WHEN 'at_risk' THEN 2
               END, launch_date
               LIMIT ?"#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Campaign::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: String,
    org_id: String,
    name: String,
    launch_date: String,
    risk_status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = DomainError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        let risk_status = CampaignRisk::from_str(&row.risk_status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid risk status: {}", row.risk_status))
        })?;

        Ok(Campaign {
            id: parse_uuid(&row.id)?,
            org_id: parse_uuid(&row.org_id)?,
            name: row.name,
            launch_date: parse_datetime(&row.launch_date)?,
            risk_status,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
