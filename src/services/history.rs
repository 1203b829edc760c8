//! In-memory recency index over one tenant's event log.
//!
//! The determiners only ever ask "when did X last happen to this task", so
//! a sweep loads the tenant's events once and folds them into per-task
//! latest-occurrence maps instead of rescanning the vector per rule.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{EscalationStage, TaskEvent, TaskEventType, TaskStatus};

/// Latest-occurrence index over a tenant's task events.
#[derive(Debug, Default, Clone)]
pub struct EventHistory {
    completions: HashMap<Uuid, DateTime<Utc>>,
    blocked: HashMap<Uuid, DateTime<Utc>>,
    escalations: HashMap<(Uuid, EscalationStage), DateTime<Utc>>,
    reminders: HashMap<(Uuid, String), DateTime<Utc>>,
}

impl EventHistory {
    /// Build the index from events in any order.
    pub fn from_events(events: &[TaskEvent]) -> Self {
        let mut history = Self::default();
        for event in events {
            history.observe(event);
        }
        history
    }

    /// Fold one event into the index, keeping the latest timestamp per key.
    pub fn observe(&mut self, event: &TaskEvent) {
        match event.event_type {
            TaskEventType::StatusChanged => {
                let Some(new_value) = event.new_value.as_deref() else {
                    return;
                };
                match TaskStatus::from_str(new_value) {
                    Some(TaskStatus::Completed) => {
                        upsert_latest(&mut self.completions, event.task_id, event.recorded_at);
                    }
                    Some(TaskStatus::Blocked) => {
                        upsert_latest(&mut self.blocked, event.task_id, event.recorded_at);
                    }
                    _ => {}
                }
            }
            TaskEventType::EscalationStage1
            | TaskEventType::EscalationStage2
            | TaskEventType::EscalationStage3 => {
                if let Some(stage) = event.event_type.escalation_stage() {
                    upsert_latest(
                        &mut self.escalations,
                        (event.task_id, stage),
                        event.recorded_at,
                    );
                }
            }
            TaskEventType::ReminderSent => {
                if let Some(kind) = event.new_value.as_deref() {
                    upsert_latest(
                        &mut self.reminders,
                        (event.task_id, kind.to_string()),
                        event.recorded_at,
                    );
                }
            }
            TaskEventType::RiskFlagSet | TaskEventType::RiskPropagated => {}
        }
    }

    /// When the task last transitioned to completed.
    pub fn last_completed_at(&self, task_id: Uuid) -> Option<DateTime<Utc>> {
        self.completions.get(&task_id).copied()
    }

    /// When the task last transitioned to blocked.
    pub fn last_blocked_at(&self, task_id: Uuid) -> Option<DateTime<Utc>> {
        self.blocked.get(&task_id).copied()
    }

    /// When the given escalation stage last fired for the task.
    pub fn last_escalation_at(
        &self,
        task_id: Uuid,
        stage: EscalationStage,
    ) -> Option<DateTime<Utc>> {
        self.escalations.get(&(task_id, stage)).copied()
    }

    /// When a reminder of the given kind was last sent for the task.
    pub fn last_reminder_at(&self, task_id: Uuid, kind: &str) -> Option<DateTime<Utc>> {
        self.reminders.get(&(task_id, kind.to_string())).copied()
    }
}

fn upsert_latest<K: std::hash::Hash + Eq>(
    map: &mut HashMap<K, DateTime<Utc>>,
    key: K,
    at: DateTime<Utc>,
) {
    map.entry(key)
        .and_modify(|existing| {
            if at > *existing {
                *existing = at;
            }
        })
        .or_insert(at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_latest_completion_wins() {
        let org_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let now = Utc::now();

        let events = vec![
            TaskEvent::status_changed(
                org_id,
                task_id,
                actor,
                "in_progress",
                "completed",
                now - Duration::hours(10),
            ),
            TaskEvent::status_changed(
                org_id,
                task_id,
                actor,
                "in_progress",
                "completed",
                now - Duration::hours(2),
            ),
        ];
        // order independence
        let history = EventHistory::from_events(&events);
        let reversed: Vec<_> = events.into_iter().rev().collect();
        let history_rev = EventHistory::from_events(&reversed);

        assert_eq!(
            history.last_completed_at(task_id),
            Some(now - Duration::hours(2))
        );
        assert_eq!(
            history.last_completed_at(task_id),
            history_rev.last_completed_at(task_id)
        );
    }

    #[test]
    fn test_blocked_and_completed_tracked_separately() {
        let org_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let now = Utc::now();

        let events = vec![TaskEvent::status_changed(
            org_id,
            task_id,
            actor,
            "in_progress",
            "blocked",
            now,
        )];
        let history = EventHistory::from_events(&events);

        assert_eq!(history.last_blocked_at(task_id), Some(now));
        assert_eq!(history.last_completed_at(task_id), None);
    }

    #[test]
    fn test_reminders_keyed_by_kind() {
        let org_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let now = Utc::now();

        let events = vec![
            TaskEvent::reminder_sent(org_id, task_id, "24h", now - Duration::hours(3)),
            TaskEvent::reminder_sent(org_id, task_id, "due_today", now),
        ];
        let history = EventHistory::from_events(&events);

        assert_eq!(
            history.last_reminder_at(task_id, "24h"),
            Some(now - Duration::hours(3))
        );
        assert_eq!(history.last_reminder_at(task_id, "due_today"), Some(now));
        assert_eq!(history.last_reminder_at(task_id, "overdue"), None);
    }

    #[test]
    fn test_escalations_keyed_by_stage() {
        let org_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let now = Utc::now();

        let events = vec![TaskEvent::escalation(
            org_id,
            task_id,
            EscalationStage::Stage1,
            "hard",
            now,
        )];
        let history = EventHistory::from_events(&events);

        assert_eq!(
            history.last_escalation_at(task_id, EscalationStage::Stage1),
            Some(now)
        );
        assert_eq!(
            history.last_escalation_at(task_id, EscalationStage::Stage2),
            None
        );
    }

    #[test]
    fn test_malformed_status_event_ignored() {
        let org_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let mut event = TaskEvent::status_changed(
            org_id,
            task_id,
            Uuid::new_v4(),
            "in_progress",
            "completed",
            Utc::now(),
        );
        event.new_value = None;

        let history = EventHistory::from_events(&[event]);
        assert_eq!(history.last_completed_at(task_id), None);
    }
}
