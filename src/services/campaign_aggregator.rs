//! Campaign-level risk aggregation.
//!
//! Recomputed from scratch every sweep out of the post-evaluation task
//! flags, so campaign health recovers on its own as tasks complete.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::{Campaign, CampaignRisk, RiskFlag, TaskStatus};

/// Hard flags that alone sink a campaign.
pub const HIGH_RISK_HARD_COUNT: usize = 3;

/// Combined hard+soft flags that put a campaign at risk.
pub const AT_RISK_FLAG_COUNT: usize = 2;

/// Hours to launch under which any open work means at-risk.
pub const LAUNCH_HORIZON_HOURS: i64 = 48;

/// Post-evaluation snapshot of one task, as the aggregator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRiskView {
    pub status: TaskStatus,
    pub flag: RiskFlag,
}

/// Derive a campaign's health from its tasks' evaluated flags.
///
/// Flags on completed tasks are ignored; a task leaves the tally the
/// moment it completes, whatever flag it died with.
pub fn assess_campaign(
    campaign: &Campaign,
    tasks: &[TaskRiskView],
    now: DateTime<Utc>,
) -> CampaignRisk {
    if campaign.is_past_launch(now) {
        return CampaignRisk::HighRisk;
    }

    let mut hard = 0usize;
    let mut soft = 0usize;
    let mut pending = 0usize;
    for view in tasks {
        if view.status == TaskStatus::Completed {
            continue;
        }
        pending += 1;
        match view.flag {
            RiskFlag::Hard => hard += 1,
            RiskFlag::Soft => soft += 1,
            RiskFlag::None => {}
        }
    }

    if hard >= HIGH_RISK_HARD_COUNT {
        return CampaignRisk::HighRisk;
    }
    if hard + soft >= AT_RISK_FLAG_COUNT {
        return CampaignRisk::AtRisk;
    }
    if pending > 0 && campaign.time_to_launch(now) <= Duration::hours(LAUNCH_HORIZON_HOURS) {
        return CampaignRisk::AtRisk;
    }

    CampaignRisk::Normal
}
