//! Campaign domain model.
//!
//! A campaign groups the tasks that must land before a launch date. The
//! engine derives its `risk_status` from the flags on its tasks; nothing
//! else writes that column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived health of a campaign.
///
/// Unlike task flags this value is recomputed from scratch on every sweep,
/// so it can move in both directions as tasks complete or deteriorate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignRisk {
    /// On track
    Normal,
    /// Warning signals are accumulating
    AtRisk,
    /// Launch is past or hard failures have piled up
    HighRisk,
}

impl Default for CampaignRisk {
    fn default() -> Self {
        Self::Normal
    }
}

impl CampaignRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AtRisk => "at_risk",
            Self::HighRisk => "high_risk",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "at_risk" => Some(Self::AtRisk),
            "high_risk" => Some(Self::HighRisk),
            _ => None,
        }
    }
}

/// A launch effort whose health is rolled up from its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique identifier
    pub id: Uuid,
    /// Owning tenant organization
    pub org_id: Uuid,
    /// Human-readable name
    pub name: String,
    /// Date the campaign is supposed to ship
    pub launch_date: DateTime<Utc>,
    /// Health derived by the aggregation sweep
    pub risk_status: CampaignRisk,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Create a new campaign with normal health.
    pub fn new(org_id: Uuid, name: impl Into<String>, launch_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            name: name.into(),
            launch_date,
            risk_status: CampaignRisk::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Time remaining until launch. Negative once the date has passed.
    pub fn time_to_launch(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.launch_date - now
    }

    /// Whether the launch date has passed.
    pub fn is_past_launch(&self, now: DateTime<Utc>) -> bool {
        now > self.launch_date
    }
}
