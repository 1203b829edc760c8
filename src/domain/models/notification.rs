//! Notification domain model.
//!
//! The engine's only outward-facing output. Notifications are plain rows an
//! inbox UI can render; delivery transports are out of scope here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::event::EscalationStage;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Stage 1 escalation, sent to the task owner
    EscalationOwner,
    /// Stage 2 escalation, sent to org managers
    EscalationManager,
    /// Stage 3 escalation, sent to org founders
    EscalationFounder,
    /// Due date roughly a day out
    ReminderUpcoming,
    /// Due this morning
    ReminderDueToday,
    /// Past due
    ReminderOverdue,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EscalationOwner => "escalation_owner",
            Self::EscalationManager => "escalation_manager",
            Self::EscalationFounder => "escalation_founder",
            Self::ReminderUpcoming => "reminder_upcoming",
            Self::ReminderDueToday => "reminder_due_today",
            Self::ReminderOverdue => "reminder_overdue",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "escalation_owner" => Some(Self::EscalationOwner),
            "escalation_manager" => Some(Self::EscalationManager),
            "escalation_founder" => Some(Self::EscalationFounder),
            "reminder_upcoming" => Some(Self::ReminderUpcoming),
            "reminder_due_today" => Some(Self::ReminderDueToday),
            "reminder_overdue" => Some(Self::ReminderOverdue),
            _ => None,
        }
    }

    /// Kind used when the given escalation stage fires.
    pub fn for_stage(stage: EscalationStage) -> Self {
        match stage {
            EscalationStage::Stage1 => Self::EscalationOwner,
            EscalationStage::Stage2 => Self::EscalationManager,
            EscalationStage::Stage3 => Self::EscalationFounder,
        }
    }
}

/// An inbox entry for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Owning tenant organization
    pub org_id: Uuid,
    /// User the notification is addressed to
    pub recipient_id: Uuid,
    /// Task it concerns, when task-scoped
    pub task_id: Option<Uuid>,
    /// Campaign it concerns, when campaign-scoped
    pub campaign_id: Option<Uuid>,
    /// What it is about
    pub kind: NotificationKind,
    /// Rendered message body
    pub message: String,
    /// Whether the recipient has seen it
    pub read: bool,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Notification about a task, addressed to one recipient.
    pub fn for_task(
        org_id: Uuid,
        recipient_id: Uuid,
        task_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id,
            recipient_id,
            task_id: Some(task_id),
            campaign_id: None,
            kind,
            message: message.into(),
            read: false,
            created_at,
        }
    }
}
