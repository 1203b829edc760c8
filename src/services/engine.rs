//! Sweep orchestration for the risk and reminder engines.
//!
//! A run takes the engine's named lock, resolves the next page of tenant
//! organizations from the sweep cursor, fans the page out with a bounded
//! concurrency limit, and advances the cursor. Per-tenant work is a pure
//! evaluation pass over that tenant's tasks and event history followed by
//! the resulting writes: flag updates, event appends, campaign status
//! updates, escalations and reminders.
//!
//! Every mutation point is idempotent: flags are compared before writing,
//! and escalation/reminder cooldowns are answered from the event log, so a
//! crashed run that re-covers the same tenants cannot duplicate effects.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    EngineConfig, EscalationStage, MemberRole, Notification, NotificationKind, ReminderConfig,
    RiskFlag, Task, TaskEvent,
};
use crate::domain::ports::{
    CacheInvalidator, CampaignRepository, NotificationSink, SweepCoordinator, TaskEventLog,
    TaskRepository, TenantDirectory,
};
use crate::services::campaign_aggregator::{assess_campaign, TaskRiskView};
use crate::services::escalation::next_stage;
use crate::services::history::EventHistory;
use crate::services::reminders::{next_reminder, ReminderKind};
use crate::services::risk_evaluator::evaluate_task;
use crate::services::risk_propagator::propagate_risk;

/// Lock and cursor name of the hourly risk sweep.
pub const RISK_ENGINE_LOCK: &str = "risk_engine";

/// Lock and cursor name of the half-hourly reminder sweep.
pub const REMINDERS_LOCK: &str = "reminders";

/// Which logical engine a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Evaluation, propagation, aggregation, escalation
    Risk,
    /// Due-date reminders
    Reminders,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Reminders => "reminders",
        }
    }

    /// Name of the lock row and cursor row this engine coordinates on.
    pub fn lock_name(&self) -> &'static str {
        match self {
            Self::Risk => RISK_ENGINE_LOCK,
            Self::Reminders => REMINDERS_LOCK,
        }
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub tenants_processed: usize,
    pub tenants_failed: usize,
    pub tasks_evaluated: usize,
    pub flags_raised: usize,
    pub propagations: usize,
    pub campaigns_updated: usize,
    pub escalations: usize,
    pub reminders_sent: usize,
    pub units_failed: usize,
}

impl RunStats {
    fn merge(&mut self, other: &RunStats) {
        self.tenants_processed += other.tenants_processed;
        self.tenants_failed += other.tenants_failed;
        self.tasks_evaluated += other.tasks_evaluated;
        self.flags_raised += other.flags_raised;
        self.propagations += other.propagations;
        self.campaigns_updated += other.campaigns_updated;
        self.escalations += other.escalations;
        self.reminders_sent += other.reminders_sent;
        self.units_failed += other.units_failed;
    }
}

/// Outcome of one run attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run executed; counters attached
    Completed(RunStats),
    /// Another runner holds the lock; nothing was done
    LockHeld,
}

/// The sweep orchestrator. Cheap to clone; all dependencies are shared.
#[derive(Clone)]
pub struct RiskEngine {
    tasks: Arc<dyn TaskRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    events: Arc<dyn TaskEventLog>,
    tenants: Arc<dyn TenantDirectory>,
    coordinator: Arc<dyn SweepCoordinator>,
    notifications: Arc<dyn NotificationSink>,
    cache: Arc<dyn CacheInvalidator>,
    config: EngineConfig,
    reminder_windows: ReminderConfig,
}

impl RiskEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        campaigns: Arc<dyn CampaignRepository>,
        events: Arc<dyn TaskEventLog>,
        tenants: Arc<dyn TenantDirectory>,
        coordinator: Arc<dyn SweepCoordinator>,
        notifications: Arc<dyn NotificationSink>,
        cache: Arc<dyn CacheInvalidator>,
        config: EngineConfig,
        reminder_windows: ReminderConfig,
    ) -> Self {
        Self {
            tasks,
            campaigns,
            events,
            tenants,
            coordinator,
            notifications,
            cache,
            config,
            reminder_windows,
        }
    }

    /// Cron-mode sweep: lock, page of tenants, fan out, advance cursor.
    ///
    /// Lock contention is a normal skip, not an error. The lock is released
    /// even when the sweep body fails.
    #[instrument(skip(self), fields(engine = kind.as_str()))]
    pub async fn run_sweep(&self, kind: EngineKind) -> DomainResult<RunOutcome> {
        if !self
            .coordinator
            .try_acquire(kind.lock_name(), self.lock_ttl(kind))
            .await?
        {
            info!(engine = kind.as_str(), "sweep lock held elsewhere, skipping run");
            return Ok(RunOutcome::LockHeld);
        }

        let result = self.run_locked_sweep(kind).await;

        if let Err(error) = self.coordinator.release(kind.lock_name()).await {
            warn!(engine = kind.as_str(), %error, "failed to release sweep lock");
        }

        result.map(RunOutcome::Completed)
    }

    /// Event-mode run: one tenant, same lock, no pagination.
    ///
    /// Invoked from the task-mutation path right after a status change, so
    /// it serializes behind any concurrent cron sweep of the same engine.
    #[instrument(skip(self), fields(engine = kind.as_str(), org_id = %org_id))]
    pub async fn run_for_tenant(&self, kind: EngineKind, org_id: Uuid) -> DomainResult<RunOutcome> {
        if !self
            .coordinator
            .try_acquire(kind.lock_name(), self.lock_ttl(kind))
            .await?
        {
            info!(engine = kind.as_str(), "sweep lock held elsewhere, skipping run");
            return Ok(RunOutcome::LockHeld);
        }

        let result = self.process_tenant(kind, org_id).await;

        if let Err(error) = self.coordinator.release(kind.lock_name()).await {
            warn!(engine = kind.as_str(), %error, "failed to release sweep lock");
        }

        result.map(|mut stats| {
            stats.tenants_processed = 1;
            RunOutcome::Completed(stats)
        })
    }

    fn lock_ttl(&self, kind: EngineKind) -> StdDuration {
        match kind {
            EngineKind::Risk => StdDuration::from_secs(self.config.risk_lock_ttl_secs),
            EngineKind::Reminders => StdDuration::from_secs(self.config.reminder_lock_ttl_secs),
        }
    }

    async fn run_locked_sweep(&self, kind: EngineKind) -> DomainResult<RunStats> {
        let cursor = self.coordinator.read_cursor(kind.lock_name()).await?;
        let page = self
            .tenants
            .page_after(cursor.last_org_id, cursor.page_size)
            .await?;

        let stats = self.process_page(kind, &page).await?;

        // a short page means the sweep reached the end of the tenant set,
        // wrap the cursor so the next run starts over
        let next = if (page.len() as u32) < cursor.page_size {
            None
        } else {
            page.last().copied()
        };
        self.coordinator.advance_cursor(kind.lock_name(), next).await?;

        info!(
            engine = kind.as_str(),
            tenants = page.len(),
            processed = stats.tenants_processed,
            failed = stats.tenants_failed,
            wrapped = next.is_none(),
            "sweep finished"
        );
        Ok(stats)
    }

    /// Fan a page of tenants out under the configured concurrency bound.
    /// One tenant's failure never aborts the page.
    async fn process_page(&self, kind: EngineKind, org_ids: &[Uuid]) -> DomainResult<RunStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_tenants));
        let mut handles = Vec::with_capacity(org_ids.len());

        for &org_id in org_ids {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ValidationFailed("Semaphore closed".to_string()))?;
            let engine = self.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                (org_id, engine.process_tenant(kind, org_id).await)
            });
            handles.push(handle);
        }

        let mut stats = RunStats::default();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(tenant_stats))) => {
                    stats.merge(&tenant_stats);
                    stats.tenants_processed += 1;
                }
                Ok((org_id, Err(error))) => {
                    warn!(org_id = %org_id, %error, "tenant sweep failed, continuing");
                    stats.tenants_failed += 1;
                }
                Err(error) => {
                    warn!(%error, "tenant sweep task aborted, continuing");
                    stats.tenants_failed += 1;
                }
            }
        }
        Ok(stats)
    }

    #[instrument(skip(self), fields(engine = kind.as_str(), org_id = %org_id))]
    async fn process_tenant(&self, kind: EngineKind, org_id: Uuid) -> DomainResult<RunStats> {
        match kind {
            EngineKind::Risk => self.risk_pass(org_id).await,
            EngineKind::Reminders => self.reminder_pass(org_id).await,
        }
    }

    /// One tenant's risk pass: evaluate, propagate, escalate, aggregate.
    async fn risk_pass(&self, org_id: Uuid) -> DomainResult<RunStats> {
        let now = Utc::now();
        let mut stats = RunStats::default();

        let task_list = self.tasks.list_by_org(org_id).await?;
        let event_list = self.events.list_by_org(org_id).await?;
        let history = EventHistory::from_events(&event_list);

        let tasks_by_id: HashMap<Uuid, Task> =
            task_list.into_iter().map(|t| (t.id, t)).collect();

        // phase 1: pure evaluation of every open task into the effective map
        let mut effective: HashMap<Uuid, RiskFlag> = HashMap::with_capacity(tasks_by_id.len());
        for task in tasks_by_id.values() {
            let flag = if task.is_completed() {
                RiskFlag::None
            } else {
                stats.tasks_evaluated += 1;
                evaluate_task(task, &history, now)
            };
            effective.insert(task.id, flag);
        }

        // phase 2: persist flags that moved
        let mut changed = false;
        for task in tasks_by_id.values() {
            let flag = effective[&task.id];
            if task.is_completed() || flag == task.risk_flag {
                continue;
            }
            match self.write_flag(task, flag, None, now).await {
                Ok(()) => {
                    stats.flags_raised += 1;
                    changed = true;
                }
                Err(error) => {
                    warn!(org_id = %org_id, task_id = %task.id, %error, "flag write failed, skipping task");
                    stats.units_failed += 1;
                }
            }
        }

        // phase 3: propagation over the merged effective map
        for promotion in propagate_risk(&tasks_by_id, &effective) {
            let task = &tasks_by_id[&promotion.task_id];
            match self
                .write_flag(task, RiskFlag::Soft, Some(promotion.origin_task_id), now)
                .await
            {
                Ok(()) => {
                    effective.insert(promotion.task_id, RiskFlag::Soft);
                    stats.propagations += 1;
                    changed = true;
                }
                Err(error) => {
                    warn!(org_id = %org_id, task_id = %promotion.task_id, %error, "propagation write failed, skipping task");
                    stats.units_failed += 1;
                }
            }
        }

        // phase 4: escalations over post-propagation flags
        for task in tasks_by_id.values() {
            if task.is_completed() {
                continue;
            }
            let mut current = task.clone();
            current.risk_flag = effective[&task.id];
            let Some(stage) = next_stage(&current, &history, now) else {
                continue;
            };
            match self.fire_escalation(&current, stage, now).await {
                Ok(()) => stats.escalations += 1,
                Err(error) => {
                    warn!(org_id = %org_id, task_id = %task.id, stage = stage.as_str(), %error, "escalation failed, skipping task");
                    stats.units_failed += 1;
                }
            }
        }

        // phase 5: campaign aggregation from the same effective flags
        let mut views_by_campaign: HashMap<Uuid, Vec<TaskRiskView>> = HashMap::new();
        for task in tasks_by_id.values() {
            views_by_campaign
                .entry(task.campaign_id)
                .or_default()
                .push(TaskRiskView {
                    status: task.status,
                    flag: effective[&task.id],
                });
        }
        for campaign in self.campaigns.list_by_org(org_id).await? {
            let views = views_by_campaign
                .get(&campaign.id)
                .map_or(&[] as &[TaskRiskView], Vec::as_slice);
            let assessed = assess_campaign(&campaign, views, now);
            if assessed == campaign.risk_status {
                continue;
            }
            match self
                .campaigns
                .set_risk_status(org_id, campaign.id, assessed)
                .await
            {
                Ok(()) => {
                    debug!(org_id = %org_id, campaign_id = %campaign.id, status = assessed.as_str(), "campaign risk updated");
                    stats.campaigns_updated += 1;
                    changed = true;
                }
                Err(error) => {
                    warn!(org_id = %org_id, campaign_id = %campaign.id, %error, "campaign update failed, skipping campaign");
                    stats.units_failed += 1;
                }
            }
        }

        if changed {
            self.cache.invalidate(org_id).await;
        }
        Ok(stats)
    }

    /// One tenant's reminder pass.
    async fn reminder_pass(&self, org_id: Uuid) -> DomainResult<RunStats> {
        let now = Utc::now();
        let mut stats = RunStats::default();

        let task_list = self.tasks.list_by_org(org_id).await?;
        let event_list = self.events.list_by_org(org_id).await?;
        let history = EventHistory::from_events(&event_list);

        let mut changed = false;
        for task in &task_list {
            if task.is_completed() {
                continue;
            }
            let Some(kind) = next_reminder(task, &history, now, &self.reminder_windows) else {
                continue;
            };
            match self.fire_reminder(task, kind, now).await {
                Ok(flag_forced) => {
                    stats.reminders_sent += 1;
                    if flag_forced {
                        stats.flags_raised += 1;
                        changed = true;
                    }
                }
                Err(error) => {
                    warn!(org_id = %org_id, task_id = %task.id, kind = kind.as_str(), %error, "reminder failed, skipping task");
                    stats.units_failed += 1;
                }
            }
        }

        if changed {
            self.cache.invalidate(org_id).await;
        }
        Ok(stats)
    }

    /// Persist a raised flag: write the column first, then the audit event.
    /// In this order a failure between the two leaves sticky state the next
    /// run agrees with instead of a duplicate event.
    async fn write_flag(
        &self,
        task: &Task,
        flag: RiskFlag,
        origin_task_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.tasks.set_risk_flag(task.org_id, task.id, flag).await?;
        let event = match origin_task_id {
            Some(origin) => TaskEvent::risk_propagated(
                task.org_id,
                task.id,
                task.risk_flag.as_str(),
                flag.as_str(),
                origin,
                now,
            ),
            None => TaskEvent::risk_flag_set(
                task.org_id,
                task.id,
                task.risk_flag.as_str(),
                flag.as_str(),
                now,
            ),
        };
        self.events.append(&event).await?;
        debug!(task_id = %task.id, flag = flag.as_str(), "risk flag raised");
        Ok(())
    }

    /// Append the stage event, then notify the stage's audience. The event
    /// goes first so the cooldown holds even if delivery fails.
    async fn fire_escalation(
        &self,
        task: &Task,
        stage: EscalationStage,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let event = TaskEvent::escalation(task.org_id, task.id, stage, task.risk_flag.as_str(), now);
        self.events.append(&event).await?;

        let recipients = match stage {
            EscalationStage::Stage1 => match task.assignee_id {
                Some(owner) => vec![owner],
                None => {
                    debug!(task_id = %task.id, "stage 1 on unassigned task, event logged without notification");
                    vec![]
                }
            },
            EscalationStage::Stage2 => {
                self.tenants
                    .members_by_role(task.org_id, MemberRole::Manager)
                    .await?
            }
            EscalationStage::Stage3 => {
                self.tenants
                    .members_by_role(task.org_id, MemberRole::Founder)
                    .await?
            }
        };

        let message = escalation_message(task, stage);
        for recipient_id in recipients {
            let notification = Notification::for_task(
                task.org_id,
                recipient_id,
                task.id,
                NotificationKind::for_stage(stage),
                message.clone(),
                now,
            );
            self.notifications.deliver(&notification).await?;
        }
        info!(task_id = %task.id, stage = stage.as_str(), "escalation fired");
        Ok(())
    }

    /// Log the reminder event, then notify the assignee. Returns whether the
    /// overdue rule forced the flag hard.
    async fn fire_reminder(
        &self,
        task: &Task,
        kind: ReminderKind,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        // the one overlap with the evaluator path: an overdue reminder
        // hardens the flag on the spot
        let mut flag_forced = false;
        if kind == ReminderKind::Overdue && task.risk_flag != RiskFlag::Hard {
            self.write_flag(task, RiskFlag::Hard, None, now).await?;
            flag_forced = true;
        }

        let event = TaskEvent::reminder_sent(task.org_id, task.id, kind.as_str(), now);
        self.events.append(&event).await?;

        match task.assignee_id {
            Some(recipient_id) => {
                let notification = Notification::for_task(
                    task.org_id,
                    recipient_id,
                    task.id,
                    kind.notification_kind(),
                    reminder_message(task, kind),
                    now,
                );
                self.notifications.deliver(&notification).await?;
            }
            None => {
                debug!(task_id = %task.id, kind = kind.as_str(), "reminder on unassigned task, event logged without notification");
            }
        }
        Ok(flag_forced)
    }
}

fn escalation_message(task: &Task, stage: EscalationStage) -> String {
    match stage {
        EscalationStage::Stage1 => format!(
            "Task \"{}\" is at {} risk and needs attention",
            task.name,
            task.risk_flag.as_str()
        ),
        EscalationStage::Stage2 => format!(
            "Task \"{}\" has been at risk for over 24 hours without resolution",
            task.name
        ),
        EscalationStage::Stage3 => format!(
            "Task \"{}\" has been at risk for over 48 hours and needs founder attention",
            task.name
        ),
    }
}

fn reminder_message(task: &Task, kind: ReminderKind) -> String {
    match kind {
        ReminderKind::Overdue => format!("Task \"{}\" is overdue", task.name),
        ReminderKind::Upcoming24h => format!("Task \"{}\" is due in about a day", task.name),
        ReminderKind::DueToday => format!("Task \"{}\" is due today", task.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_lock_names() {
        assert_eq!(EngineKind::Risk.lock_name(), "risk_engine");
        assert_eq!(EngineKind::Reminders.lock_name(), "reminders");
    }

    #[test]
    fn test_run_stats_merge() {
        let mut total = RunStats::default();
        let tenant = RunStats {
            tasks_evaluated: 4,
            flags_raised: 2,
            propagations: 1,
            ..Default::default()
        };
        total.merge(&tenant);
        total.merge(&tenant);
        assert_eq!(total.tasks_evaluated, 8);
        assert_eq!(total.flags_raised, 4);
        assert_eq!(total.propagations, 2);
        assert_eq!(total.tenants_processed, 0);
    }
}
