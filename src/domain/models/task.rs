//! Task domain model.
//!
//! Tasks are the unit of campaign work the risk engine evaluates. Each task
//! belongs to one campaign and may wait on at most one upstream task, so
//! dependencies form a forest rather than a general graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Status of a task in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task exists but work has not begun
    NotStarted,
    /// Task is actively being worked
    InProgress,
    /// Task finished; terminal, excluded from all risk evaluation
    Completed,
    /// Task is waiting on something outside the normal flow
    Blocked,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "complete" | "completed" => Some(Self::Completed),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Check if this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::NotStarted => vec![Self::InProgress],
            Self::InProgress => vec![Self::Completed, Self::Blocked],
            Self::Blocked => vec![Self::InProgress],
            Self::Completed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Execution risk classification for a task.
///
/// Ordered by severity. The engine only ever moves a flag upward
/// (`None < Soft < Hard`); the single exit from risk tracking is task
/// completion. There is no downgrade transition: a task whose blocking
/// condition resolves keeps its flag until it is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    /// No risk signal observed
    None,
    /// Early-warning signal (stale assignment, dependency gap, short block)
    Soft,
    /// Serious signal (overdue, long block, three of these sink a campaign)
    Hard,
}

impl Default for RiskFlag {
    fn default() -> Self {
        Self::None
    }
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Soft => "soft",
            Self::Hard => "hard",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "soft" => Some(Self::Soft),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Sticky-upward escalation: the more severe of the two flags.
    pub fn escalated_to(self, target: RiskFlag) -> RiskFlag {
        self.max(target)
    }

    /// Whether the flag marks the task as at risk at all.
    pub fn is_flagged(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A unit of campaign work tracked by the risk engine.
///
/// Created and status-mutated by the surrounding CRUD layer; the engine only
/// ever writes `risk_flag` (and reads everything else).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Owning tenant organization
    pub org_id: Uuid,
    /// Campaign this task belongs to
    pub campaign_id: Uuid,
    /// At most one upstream task this one waits on
    pub dependency_id: Option<Uuid>,
    /// Human-readable name
    pub name: String,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Current risk classification
    pub risk_flag: RiskFlag,
    /// User responsible for the task
    pub assignee_id: Option<Uuid>,
    /// Set once when ownership is first assigned
    pub assigned_at: Option<DateTime<Utc>>,
    /// Deadline the reminder and overdue rules key off
    pub due_date: DateTime<Utc>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task in its initial state.
    pub fn new(
        org_id: Uuid,
        campaign_id: Uuid,
        name: impl Into<String>,
        due_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            campaign_id,
            dependency_id: None,
            name: name.into(),
            status: TaskStatus::default(),
            risk_flag: RiskFlag::default(),
            assignee_id: None,
            assigned_at: None,
            due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the upstream dependency.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        if task_id != self.id {
            self.dependency_id = Some(task_id);
        }
        self
    }

    /// Assign ownership; records `assigned_at` the first time only.
    pub fn with_assignee(mut self, user_id: Uuid) -> Self {
        self.assignee_id = Some(user_id);
        if self.assigned_at.is_none() {
            self.assigned_at = Some(Utc::now());
        }
        self
    }

    /// Set the current status without going through the state machine.
    /// Intended for loading persisted rows and for test fixtures.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to new status. The engine never calls this; it exists for
    /// the mutation boundary and for fixtures, so illegal states cannot
    /// reach the evaluators.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), DomainError> {
        if !self.can_transition_to(new_status) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether this task has left risk tracking.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
