//! Per-task risk evaluation rules.
//!
//! Pure and idempotent: the same task, history, and clock always produce
//! the same flag, and a flag can only move upward. Running the evaluator
//! twice in a row is therefore a no-op by construction.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::{RiskFlag, Task, TaskStatus};
use crate::services::history::EventHistory;

/// Hours an assigned task may sit not-started before it counts as stale.
pub const STALE_ASSIGNMENT_AFTER_HOURS: i64 = 24;

/// Hours after a dependency completes before a still-unstarted dependent
/// counts as lagging.
pub const DEPENDENCY_GAP_AFTER_HOURS: i64 = 12;

/// Hours a task may stay blocked before the flag hardens.
pub const BLOCKED_HARD_AFTER_HOURS: i64 = 24;

/// Evaluate one task's risk flag against the clock and its tenant history.
///
/// Completed tasks always come out `None`. Everything else starts from the
/// task's current flag and folds in whichever rules fire, keeping the most
/// severe result. The caller is responsible for persisting the flag and the
/// matching event when the result differs from the stored one.
pub fn evaluate_task(task: &Task, history: &EventHistory, now: DateTime<Utc>) -> RiskFlag {
    if task.status == TaskStatus::Completed {
        return RiskFlag::None;
    }

    let mut flag = task.risk_flag;

    // Rule 1: assigned over 24h ago and still not started.
    if task.status == TaskStatus::NotStarted {
        if let Some(assigned_at) = task.assigned_at {
            if now - assigned_at > Duration::hours(STALE_ASSIGNMENT_AFTER_HOURS) {
                flag = flag.escalated_to(RiskFlag::Soft);
            }
        }
    }

    // Rule 2: upstream dependency completed over 12h ago, dependent not started.
    if task.status == TaskStatus::NotStarted {
        if let Some(dependency_id) = task.dependency_id {
            if let Some(completed_at) = history.last_completed_at(dependency_id) {
                if now - completed_at > Duration::hours(DEPENDENCY_GAP_AFTER_HOURS) {
                    flag = flag.escalated_to(RiskFlag::Soft);
                }
            }
        }
    }

    // Rule 3: past due. Dominates everything below soft.
    if task.due_date < now {
        flag = flag.escalated_to(RiskFlag::Hard);
    }

    // Rule 4: blocked duration, read from the status history. A blocked task
    // with no blocked event is a data gap; the rule stays silent rather than
    // guessing a start time.
    if task.status == TaskStatus::Blocked {
        if let Some(blocked_at) = history.last_blocked_at(task.id) {
            let blocked_for = now - blocked_at;
            if blocked_for > Duration::hours(BLOCKED_HARD_AFTER_HOURS) {
                flag = flag.escalated_to(RiskFlag::Hard);
            } else if blocked_for > Duration::zero() {
                flag = flag.escalated_to(RiskFlag::Soft);
            }
        }
    }

    flag
}
