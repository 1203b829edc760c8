//! Escalation stage determination for flagged tasks.
//!
//! Stages widen the audience as a flag lingers: owner, then managers, then
//! founders. All timing is reconstructed from escalation events, measured
//! from the most recent stage-1 firing. Stage 1 keeps re-firing as a
//! periodic nag even after the higher stages have gone out.
//!
//! Note the deliberate reuse of one constant per stage: the same duration
//! gates both "time since stage 1" and "time since this stage last fired"
//! for stages 2 and 3. Splitting those into separate knobs would change
//! long-run cadence, so they stay fused until product says otherwise.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::{EscalationStage, RiskFlag, Task, TaskStatus};
use crate::services::history::EventHistory;

/// Hours before stage 1 may re-fire.
pub const STAGE1_COOLDOWN_HOURS: i64 = 12;

/// Hours after stage 1 before stage 2 fires, and between stage-2 firings.
pub const STAGE2_THRESHOLD_HOURS: i64 = 24;

/// Hours after stage 1 before stage 3 fires, and between stage-3 firings.
pub const STAGE3_THRESHOLD_HOURS: i64 = 48;

/// Decide the next escalation stage due for a task, if any.
///
/// Unflagged and completed tasks never escalate. Stages are checked in
/// descending priority so the highest currently-due stage wins; at most
/// one stage fires per task per sweep.
pub fn next_stage(task: &Task, history: &EventHistory, now: DateTime<Utc>) -> Option<EscalationStage> {
    if task.status == TaskStatus::Completed || task.risk_flag == RiskFlag::None {
        return None;
    }

    let Some(last_stage1) = history.last_escalation_at(task.id, EscalationStage::Stage1) else {
        // nothing has fired yet, the ladder starts at the owner
        return Some(EscalationStage::Stage1);
    };
    let since_stage1 = now - last_stage1;

    if since_stage1 > Duration::hours(STAGE3_THRESHOLD_HOURS)
        && cooled_down(
            history.last_escalation_at(task.id, EscalationStage::Stage3),
            STAGE3_THRESHOLD_HOURS,
            now,
        )
    {
        return Some(EscalationStage::Stage3);
    }

    if since_stage1 > Duration::hours(STAGE2_THRESHOLD_HOURS)
        && cooled_down(
            history.last_escalation_at(task.id, EscalationStage::Stage2),
            STAGE2_THRESHOLD_HOURS,
            now,
        )
    {
        return Some(EscalationStage::Stage2);
    }

    if since_stage1 > Duration::hours(STAGE1_COOLDOWN_HOURS) {
        return Some(EscalationStage::Stage1);
    }

    None
}

fn cooled_down(last_fired: Option<DateTime<Utc>>, hours: i64, now: DateTime<Utc>) -> bool {
    match last_fired {
        None => true,
        Some(at) => now - at > Duration::hours(hours),
    }
}
