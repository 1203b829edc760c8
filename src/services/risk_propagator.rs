//! Transitive risk propagation across dependency chains.
//!
//! Runs strictly after the per-task evaluation of a tenant has produced the
//! batch's effective flags. A not-yet-started, unflagged task sitting
//! downstream of a hard-flagged ancestor is promoted to soft, with the
//! ancestor recorded as the origin. Promotions read only the frozen
//! effective map, so the result does not depend on iteration order.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::models::{RiskFlag, Task, TaskStatus};

/// One promotion decided by the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    /// Task promoted to soft
    pub task_id: Uuid,
    /// Nearest hard-flagged ancestor the risk came from
    pub origin_task_id: Uuid,
}

/// Decide all propagations for one tenant's evaluated batch.
///
/// `effective` holds the post-evaluation flag per task id; tasks missing
/// from the map fall back to their stored flag. Output is ordered by task
/// id so event writes are stable across runs.
pub fn propagate_risk(
    tasks_by_id: &HashMap<Uuid, Task>,
    effective: &HashMap<Uuid, RiskFlag>,
) -> Vec<Propagation> {
    let mut promotions = Vec::new();

    for task in tasks_by_id.values() {
        if task.status != TaskStatus::NotStarted {
            continue;
        }
        if effective_flag(task, effective) != RiskFlag::None {
            continue;
        }
        if task.dependency_id.is_none() {
            continue;
        }
        if let Some(origin_task_id) = hard_ancestor(task, tasks_by_id, effective) {
            promotions.push(Propagation {
                task_id: task.id,
                origin_task_id,
            });
        }
    }

    promotions.sort_by_key(|p| p.task_id);
    promotions
}

/// Walk the upstream chain and return the nearest hard-flagged ancestor.
///
/// A visited set stops cycles; a dangling reference stops the walk.
/// Completed ancestors count as unflagged but the walk continues past them.
fn hard_ancestor(
    task: &Task,
    tasks_by_id: &HashMap<Uuid, Task>,
    effective: &HashMap<Uuid, RiskFlag>,
) -> Option<Uuid> {
    let mut visited = HashSet::new();
    visited.insert(task.id);

    let mut current = task.dependency_id;
    while let Some(ancestor_id) = current {
        if !visited.insert(ancestor_id) {
            return None;
        }
        let ancestor = tasks_by_id.get(&ancestor_id)?;
        if effective_flag(ancestor, effective) == RiskFlag::Hard {
            return Some(ancestor_id);
        }
        current = ancestor.dependency_id;
    }
    None
}

fn effective_flag(task: &Task, effective: &HashMap<Uuid, RiskFlag>) -> RiskFlag {
    if task.is_completed() {
        return RiskFlag::None;
    }
    effective.get(&task.id).copied().unwrap_or(task.risk_flag)
}
