//! Tenant organization models.
//!
//! Every row the engine touches is scoped to an organization, and the sweep
//! walks organizations as its outer unit of work and failure isolation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user within an organization.
///
/// Escalation routing keys off this: stage 2 goes to managers, stage 3 to
/// founders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Regular member
    Member,
    /// Manages campaign delivery
    Manager,
    /// Owns the organization
    Founder,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Manager => "manager",
            Self::Founder => "founder",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "member" => Some(Self::Member),
            "manager" => Some(Self::Manager),
            "founder" => Some(Self::Founder),
            _ => None,
        }
    }
}

/// A tenant organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable name
    pub name: String,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A user's membership in an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgMember {
    /// Organization
    pub org_id: Uuid,
    /// User
    pub user_id: Uuid,
    /// Role within the org
    pub role: MemberRole,
}
