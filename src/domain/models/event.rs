//! Task event log models.
//!
//! Every state change the engine makes is recorded as an append-only event.
//! Escalation and reminder cooldowns are answered entirely from this log
//! rather than from mutable bookkeeping columns on the task itself, so a
//! crashed or re-run sweep can never double-fire a notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actor id recorded on events written by the engine itself.
pub const SYSTEM_ACTOR_ID: Uuid = Uuid::nil();

/// Escalation ladder for tasks that stay flagged.
///
/// Ordered so that the highest eligible stage wins when several are due in
/// the same sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStage {
    /// Nudge the task owner
    Stage1,
    /// Raise to the org managers
    Stage2,
    /// Raise to the org founders
    Stage3,
}

impl EscalationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage1 => "stage1",
            Self::Stage2 => "stage2",
            Self::Stage3 => "stage3",
        }
    }

    /// Event type recorded when this stage fires.
    pub fn event_type(&self) -> TaskEventType {
        match self {
            Self::Stage1 => TaskEventType::EscalationStage1,
            Self::Stage2 => TaskEventType::EscalationStage2,
            Self::Stage3 => TaskEventType::EscalationStage3,
        }
    }
}

/// Kind of a task event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventType {
    /// Lifecycle status changed (written by the mutation boundary)
    StatusChanged,
    /// Risk flag raised by direct rule evaluation
    RiskFlagSet,
    /// Risk flag raised because a downstream dependent went hard
    RiskPropagated,
    /// First escalation fired (owner notified)
    EscalationStage1,
    /// Second escalation fired (managers notified)
    EscalationStage2,
    /// Third escalation fired (founders notified)
    EscalationStage3,
    /// A reminder notification went out; written before the notification
    ReminderSent,
}

impl TaskEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusChanged => "status_changed",
            Self::RiskFlagSet => "risk_flag_set",
            Self::RiskPropagated => "risk_propagated",
            Self::EscalationStage1 => "escalation_stage1",
            Self::EscalationStage2 => "escalation_stage2",
            Self::EscalationStage3 => "escalation_stage3",
            Self::ReminderSent => "reminder_sent",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "status_changed" => Some(Self::StatusChanged),
            "risk_flag_set" => Some(Self::RiskFlagSet),
            "risk_propagated" => Some(Self::RiskPropagated),
            "escalation_stage1" => Some(Self::EscalationStage1),
            "escalation_stage2" => Some(Self::EscalationStage2),
            "escalation_stage3" => Some(Self::EscalationStage3),
            "reminder_sent" => Some(Self::ReminderSent),
            _ => None,
        }
    }

    /// Stage this event type corresponds to, if it is an escalation.
    pub fn escalation_stage(&self) -> Option<EscalationStage> {
        match self {
            Self::EscalationStage1 => Some(EscalationStage::Stage1),
            Self::EscalationStage2 => Some(EscalationStage::Stage2),
            Self::EscalationStage3 => Some(EscalationStage::Stage3),
            _ => None,
        }
    }
}

/// One append-only entry in a task's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// Owning tenant organization
    pub org_id: Uuid,
    /// Task the event belongs to
    pub task_id: Uuid,
    /// Who caused it; [`SYSTEM_ACTOR_ID`] for engine writes
    pub actor_id: Uuid,
    /// What happened
    pub event_type: TaskEventType,
    /// Value before the change, when there is one
    pub old_value: Option<String>,
    /// Value after the change, or the reminder kind for reminders
    pub new_value: Option<String>,
    /// For propagated flags, the hard-flagged task the risk came from
    pub origin_task_id: Option<Uuid>,
    /// When recorded
    pub recorded_at: DateTime<Utc>,
}

impl TaskEvent {
    fn system(
        org_id: Uuid,
        task_id: Uuid,
        event_type: TaskEventType,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id,
            task_id,
            actor_id: SYSTEM_ACTOR_ID,
            event_type,
            old_value: None,
            new_value: None,
            origin_task_id: None,
            recorded_at,
        }
    }

    /// Status change recorded on behalf of a user.
    pub fn status_changed(
        org_id: Uuid,
        task_id: Uuid,
        actor_id: Uuid,
        old_status: &str,
        new_status: &str,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id,
            old_value: Some(old_status.to_string()),
            new_value: Some(new_status.to_string()),
            ..Self::system(org_id, task_id, TaskEventType::StatusChanged, recorded_at)
        }
    }

    /// Flag raised by direct evaluation of the task's own rules.
    pub fn risk_flag_set(
        org_id: Uuid,
        task_id: Uuid,
        old_flag: &str,
        new_flag: &str,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            old_value: Some(old_flag.to_string()),
            new_value: Some(new_flag.to_string()),
            ..Self::system(org_id, task_id, TaskEventType::RiskFlagSet, recorded_at)
        }
    }

    /// Flag raised because an upstream dependency carries a hard flag.
    pub fn risk_propagated(
        org_id: Uuid,
        task_id: Uuid,
        old_flag: &str,
        new_flag: &str,
        origin_task_id: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            old_value: Some(old_flag.to_string()),
            new_value: Some(new_flag.to_string()),
            origin_task_id: Some(origin_task_id),
            ..Self::system(org_id, task_id, TaskEventType::RiskPropagated, recorded_at)
        }
    }

    /// Escalation stage fired for a flagged task.
    pub fn escalation(
        org_id: Uuid,
        task_id: Uuid,
        stage: EscalationStage,
        flag: &str,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            new_value: Some(flag.to_string()),
            ..Self::system(org_id, task_id, stage.event_type(), recorded_at)
        }
    }

    /// Reminder sent; `kind` distinguishes the cooldown windows.
    pub fn reminder_sent(
        org_id: Uuid,
        task_id: Uuid,
        kind: &str,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            new_value: Some(kind.to_string()),
            ..Self::system(org_id, task_id, TaskEventType::ReminderSent, recorded_at)
        }
    }
}
