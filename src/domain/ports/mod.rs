//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - TaskRepository / CampaignRepository: Database operations for tasks and campaigns
//! - TaskEventLog: Append-only task history
//! - TenantDirectory: Organization paging and escalation audiences
//! - SweepCoordinator: Cross-instance lock and sweep cursor
//! - NotificationSink / CacheInvalidator: Outbound effects
//!
//! These traits define the contracts that allow the domain to be independent
//! of specific infrastructure implementations.

pub mod cache_invalidator;
pub mod campaign_repository;
pub mod coordinator;
pub mod event_log;
pub mod notification_sink;
pub mod task_repository;
pub mod tenant_directory;

pub use cache_invalidator::CacheInvalidator;
pub use campaign_repository::CampaignRepository;
pub use coordinator::{EngineLock, SweepCoordinator, SweepCursor};
pub use event_log::TaskEventLog;
pub use notification_sink::NotificationSink;
pub use task_repository::TaskRepository;
pub use tenant_directory::TenantDirectory;
