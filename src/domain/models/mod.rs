pub mod campaign;
pub mod config;
pub mod event;
pub mod notification;
pub mod task;
pub mod tenant;

pub use campaign::{Campaign, CampaignRisk};
pub use config::{Config, DatabaseConfig, EngineConfig, LoggingConfig, ReminderConfig};
pub use event::{EscalationStage, TaskEvent, TaskEventType, SYSTEM_ACTOR_ID};
pub use notification::{Notification, NotificationKind};
pub use task::{RiskFlag, Task, TaskStatus};
pub use tenant::{MemberRole, OrgMember, Organization};
