//! Implementation of the `vigil status` command.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use crate::adapters::sqlite::{
    initialize_database, SqliteCampaignRepository, SqliteSweepCoordinator, SqliteTenantDirectory,
};
use crate::cli::output::{campaign_table, output, CommandOutput};
use crate::domain::models::{Campaign, Config};
use crate::domain::ports::{CampaignRepository, SweepCoordinator, TenantDirectory};
use crate::services::EngineKind;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Maximum number of flagged campaigns to list
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}

/// One engine's coordination state.
#[derive(Debug, Serialize)]
pub struct EngineStatusView {
    pub engine: &'static str,
    pub lock: Option<LockView>,
    pub cursor_position: Option<Uuid>,
    /// Resolved name of the cursor tenant, when it still exists
    pub cursor_org: Option<String>,
    pub page_size: u32,
}

/// Stored lock row, annotated with whether the lease has lapsed.
#[derive(Debug, Serialize)]
pub struct LockView {
    pub holder: Uuid,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

/// Output for the status command
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    engines: Vec<EngineStatusView>,
    campaigns: Vec<Campaign>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut lines = vec!["Vigil Status".to_string(), "============".to_string()];
        for engine in &self.engines {
            lines.push(format!("{} engine:", engine.engine));
            match &engine.lock {
                Some(lock) if !lock.expired => lines.push(format!(
                    "  lock held by {} until {}",
                    lock.holder,
                    lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                )),
                Some(lock) => lines.push(format!(
                    "  lock lapsed at {} (last holder {})",
                    lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    lock.holder
                )),
                None => lines.push("  lock free".to_string()),
            }
            match (engine.cursor_position, engine.cursor_org.as_deref()) {
                (Some(_), Some(name)) => lines.push(format!(
                    "  cursor after tenant {} ({} per run)",
                    name, engine.page_size
                )),
                (Some(id), None) => lines.push(format!(
                    "  cursor after tenant {} ({} per run)",
                    id, engine.page_size
                )),
                (None, _) => lines.push(format!(
                    "  cursor at start ({} tenants per run)",
                    engine.page_size
                )),
            }
        }
        lines.push(String::new());
        if self.campaigns.is_empty() {
            lines.push("No campaigns currently flagged".to_string());
        } else {
            lines.push(format!("Flagged campaigns ({}):", self.campaigns.len()));
            lines.push(campaign_table(&self.campaigns));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "engines": self.engines,
            "flagged_campaigns": self.campaigns.iter().map(|c| serde_json::json!({
                "id": c.id.to_string(),
                "org_id": c.org_id.to_string(),
                "name": c.name,
                "risk_status": c.risk_status.as_str(),
                "launch_date": c.launch_date.to_rfc3339(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&config.database.database_url())
        .await
        .context("Failed to initialize database")?;
    let coordinator = SqliteSweepCoordinator::new(pool.clone(), config.engine.tenant_page_size);
    let campaign_repo = SqliteCampaignRepository::new(pool.clone());
    let directory = SqliteTenantDirectory::new(pool.clone());

    let now = Utc::now();
    let mut engines = Vec::new();
    for kind in [EngineKind::Risk, EngineKind::Reminders] {
        let lock = coordinator.read_lock(kind.lock_name()).await?;
        let cursor = coordinator.read_cursor(kind.lock_name()).await?;
        let cursor_org = match cursor.last_org_id {
            Some(org_id) => directory.get(org_id).await?.map(|org| org.name),
            None => None,
        };
        engines.push(EngineStatusView {
            engine: kind.as_str(),
            lock: lock.map(|l| LockView {
                holder: l.holder,
                acquired_at: l.acquired_at,
                expires_at: l.expires_at,
                expired: l.is_expired(now),
            }),
            cursor_position: cursor.last_org_id,
            cursor_org,
            page_size: cursor.page_size,
        });
    }

    let campaigns = campaign_repo.list_flagged(args.limit).await?;

    output(&StatusOutput { engines, campaigns }, json_mode);
    Ok(())
}
