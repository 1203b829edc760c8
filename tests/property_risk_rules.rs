use std::collections::HashMap;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use vigil::domain::models::{
    Campaign, CampaignRisk, ReminderConfig, RiskFlag, Task, TaskEvent, TaskStatus,
};
use vigil::services::{
    assess_campaign, evaluate_task, next_reminder, propagate_risk, EventHistory, ReminderKind,
    TaskRiskView,
};

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::NotStarted),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Blocked),
        Just(TaskStatus::Completed),
    ]
}

fn arb_flag() -> impl Strategy<Value = RiskFlag> {
    prop_oneof![
        Just(RiskFlag::None),
        Just(RiskFlag::Soft),
        Just(RiskFlag::Hard),
    ]
}

fn severity(risk: CampaignRisk) -> u8 {
    match risk {
        CampaignRisk::Normal => 0,
        CampaignRisk::AtRisk => 1,
        CampaignRisk::HighRisk => 2,
    }
}

proptest! {
    /// Property: evaluation never downgrades a stored flag
    ///
    /// Whatever the clock and task state, the evaluator may only keep or
    /// raise the flag. The single exception is completion, which always
    /// comes out as no risk.
    #[test]
    fn prop_flag_never_downgrades(
        status in arb_status(),
        flag in arb_flag(),
        due_offset_hours in -200i64..200,
        assigned_hours_ago in proptest::option::of(0i64..100),
    ) {
        let now = Utc::now();
        let mut task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Any task",
            now + Duration::hours(due_offset_hours),
        )
        .with_status(status);
        task.risk_flag = flag;
        if let Some(hours) = assigned_hours_ago {
            task.assignee_id = Some(Uuid::new_v4());
            task.assigned_at = Some(now - Duration::hours(hours));
        }

        let result = evaluate_task(&task, &EventHistory::default(), now);
        if status == TaskStatus::Completed {
            prop_assert_eq!(result, RiskFlag::None);
        } else {
            prop_assert!(result >= flag, "flag moved down from {:?} to {:?}", flag, result);
        }
    }

    /// Property: evaluation is idempotent
    ///
    /// Persisting the evaluated flag and evaluating again under the same
    /// clock changes nothing, so a re-run sweep is a no-op.
    #[test]
    fn prop_evaluation_is_idempotent(
        status in arb_status(),
        flag in arb_flag(),
        due_offset_hours in -200i64..200,
        assigned_hours_ago in proptest::option::of(0i64..100),
    ) {
        let now = Utc::now();
        let mut task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Any task",
            now + Duration::hours(due_offset_hours),
        )
        .with_status(status);
        task.risk_flag = flag;
        if let Some(hours) = assigned_hours_ago {
            task.assignee_id = Some(Uuid::new_v4());
            task.assigned_at = Some(now - Duration::hours(hours));
        }

        let first = evaluate_task(&task, &EventHistory::default(), now);
        task.risk_flag = first;
        let second = evaluate_task(&task, &EventHistory::default(), now);
        prop_assert_eq!(second, first);
    }

    /// Property: letting the clock run never lowers the flag
    ///
    /// Every rule is a threshold on elapsed time, so with the task and its
    /// history fixed, a later evaluation can only keep or raise the result.
    #[test]
    fn prop_flag_monotone_as_clock_advances(
        status in arb_status(),
        flag in arb_flag(),
        due_offset_hours in -200i64..200,
        assigned_hours_ago in proptest::option::of(0i64..100),
        blocked_hours_ago in proptest::option::of(0i64..100),
        advance_hours in 0i64..300,
    ) {
        let now = Utc::now();
        let mut task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Any task",
            now + Duration::hours(due_offset_hours),
        )
        .with_status(status);
        task.risk_flag = flag;
        if let Some(hours) = assigned_hours_ago {
            task.assignee_id = Some(Uuid::new_v4());
            task.assigned_at = Some(now - Duration::hours(hours));
        }
        let history = match blocked_hours_ago {
            Some(hours) => EventHistory::from_events(&[TaskEvent::status_changed(
                task.org_id,
                task.id,
                Uuid::new_v4(),
                "in_progress",
                "blocked",
                now - Duration::hours(hours),
            )]),
            None => EventHistory::default(),
        };

        let earlier = evaluate_task(&task, &history, now);
        let later = evaluate_task(&task, &history, now + Duration::hours(advance_hours));
        prop_assert!(later >= earlier, "flag moved down from {:?} to {:?}", earlier, later);
    }

    /// Property: promotions only ever target quiet waiting tasks
    ///
    /// On a random linear chain, every propagation lands on a not-started,
    /// unflagged task, names a hard origin, and the list is ordered by
    /// task id.
    #[test]
    fn prop_promotions_target_only_quiet_waiting_tasks(
        spec in proptest::collection::vec((arb_status(), arb_flag()), 1..12)
    ) {
        let org_id = Uuid::new_v4();
        let campaign_id = Uuid::new_v4();
        let now = Utc::now();

        let mut tasks: HashMap<Uuid, Task> = HashMap::new();
        let mut effective: HashMap<Uuid, RiskFlag> = HashMap::new();
        let mut previous: Option<Uuid> = None;
        for (status, flag) in spec {
            let mut task = Task::new(org_id, campaign_id, "link", now + Duration::days(30))
                .with_status(status);
            task.risk_flag = flag;
            if let Some(dep) = previous {
                task = task.with_dependency(dep);
            }
            previous = Some(task.id);
            effective.insert(
                task.id,
                if status == TaskStatus::Completed { RiskFlag::None } else { flag },
            );
            tasks.insert(task.id, task);
        }

        let promotions = propagate_risk(&tasks, &effective);

        for promotion in &promotions {
            let target = &tasks[&promotion.task_id];
            prop_assert_eq!(target.status, TaskStatus::NotStarted);
            prop_assert_eq!(effective[&promotion.task_id], RiskFlag::None);
            prop_assert_eq!(effective[&promotion.origin_task_id], RiskFlag::Hard);
        }
        prop_assert!(
            promotions.windows(2).all(|w| w[0].task_id <= w[1].task_id),
            "promotions should be ordered by task id"
        );
    }

    /// Property: arbitrary dependency graphs terminate
    ///
    /// Random edges may form cycles and self-references; the walk must
    /// still finish and the promotion rules must still hold.
    #[test]
    fn prop_cycles_never_hang_or_promote_flagged(
        deps in proptest::collection::vec(proptest::option::of(0usize..12), 2..12),
        hard_seat in 0usize..12,
    ) {
        let org_id = Uuid::new_v4();
        let campaign_id = Uuid::new_v4();
        let now = Utc::now();
        let count = deps.len();

        let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
        let mut tasks: HashMap<Uuid, Task> = HashMap::new();
        let mut effective: HashMap<Uuid, RiskFlag> = HashMap::new();
        for (i, dep) in deps.iter().enumerate() {
            let mut task = Task::new(org_id, campaign_id, "node", now + Duration::days(30));
            task.id = ids[i];
            if i == hard_seat % count {
                task = task.with_status(TaskStatus::InProgress);
                task.risk_flag = RiskFlag::Hard;
            }
            if let Some(j) = dep {
                task = task.with_dependency(ids[j % count]);
            }
            effective.insert(ids[i], task.risk_flag);
            tasks.insert(ids[i], task);
        }

        let promotions = propagate_risk(&tasks, &effective);
        for promotion in &promotions {
            prop_assert_eq!(effective[&promotion.task_id], RiskFlag::None);
            prop_assert_eq!(effective[&promotion.origin_task_id], RiskFlag::Hard);
        }
    }

    /// Property: an extra hard flag never improves campaign health
    #[test]
    fn prop_extra_hard_flag_never_improves_campaign(
        launch_offset_hours in -100i64..2000,
        hard in 0usize..6,
        soft in 0usize..6,
        clean in 0usize..6,
    ) {
        let now = Utc::now();
        let campaign = Campaign::new(
            Uuid::new_v4(),
            "Launch",
            now + Duration::hours(launch_offset_hours),
        );

        let mut views = Vec::new();
        views.extend(vec![
            TaskRiskView { status: TaskStatus::InProgress, flag: RiskFlag::Hard };
            hard
        ]);
        views.extend(vec![
            TaskRiskView { status: TaskStatus::InProgress, flag: RiskFlag::Soft };
            soft
        ]);
        views.extend(vec![
            TaskRiskView { status: TaskStatus::InProgress, flag: RiskFlag::None };
            clean
        ]);

        let base = severity(assess_campaign(&campaign, &views, now));
        views.push(TaskRiskView { status: TaskStatus::InProgress, flag: RiskFlag::Hard });
        let with_extra = severity(assess_campaign(&campaign, &views, now));

        prop_assert!(with_extra >= base);
    }

    /// Property: completed tasks carry no weight in aggregation
    #[test]
    fn prop_completed_tasks_never_count(completed_hard in 0usize..10) {
        let now = Utc::now();
        let campaign = Campaign::new(Uuid::new_v4(), "Launch", now + Duration::days(60));
        let views = vec![
            TaskRiskView { status: TaskStatus::Completed, flag: RiskFlag::Hard };
            completed_hard
        ];
        prop_assert_eq!(assess_campaign(&campaign, &views, now), CampaignRisk::Normal);
    }

    /// Property: past due, the overdue reminder wins no matter the history
    #[test]
    fn prop_overdue_reminder_ignores_history(overdue_hours in 1i64..500) {
        let now = Utc::now();
        let task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Late task",
            now - Duration::hours(overdue_hours),
        )
        .with_status(TaskStatus::InProgress);

        let result = next_reminder(&task, &EventHistory::default(), now, &ReminderConfig::default());
        prop_assert_eq!(result, Some(ReminderKind::Overdue));
    }
}
