//! End-to-end sweep tests against real SQLite adapters.

mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::{
    count_events, count_notifications, engine, engine_with_page_size, seed_campaign, seed_member,
    seed_org, seed_task, setup_pool, stored_campaign_status, stored_flag,
};
use vigil::adapters::sqlite::{SqliteSweepCoordinator, SqliteTaskRepository};
use vigil::domain::models::{Task, TaskStatus};
use vigil::domain::ports::{SweepCoordinator, TaskRepository};
use vigil::services::{EngineKind, RunOutcome, RunStats};

fn completed(outcome: RunOutcome) -> RunStats {
    match outcome {
        RunOutcome::Completed(stats) => stats,
        RunOutcome::LockHeld => panic!("sweep should have acquired the lock"),
    }
}

#[tokio::test]
async fn test_overdue_task_goes_hard_and_escalates_to_owner() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let owner = seed_member(&pool, org_id, "member").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let task = Task::new(org_id, campaign.id, "Order signage", Utc::now() - Duration::hours(2))
        .with_status(TaskStatus::InProgress)
        .with_assignee(owner);
    seed_task(&pool, &task).await;

    let stats = completed(engine(&pool).run_sweep(EngineKind::Risk).await.expect("sweep"));

    assert_eq!(stats.tenants_processed, 1);
    assert_eq!(stats.tasks_evaluated, 1);
    assert_eq!(stats.flags_raised, 1);
    assert_eq!(stats.escalations, 1);
    assert_eq!(stats.tenants_failed, 0);

    assert_eq!(stored_flag(&pool, task.id).await, "hard");
    assert_eq!(count_events(&pool, task.id, "risk_flag_set").await, 1);
    assert_eq!(count_events(&pool, task.id, "escalation_stage1").await, 1);
    assert_eq!(count_notifications(&pool, "escalation_owner").await, 1);
}

#[tokio::test]
async fn test_second_sweep_changes_nothing() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let owner = seed_member(&pool, org_id, "member").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let task = Task::new(org_id, campaign.id, "Order signage", Utc::now() - Duration::hours(2))
        .with_status(TaskStatus::InProgress)
        .with_assignee(owner);
    seed_task(&pool, &task).await;

    let engine = engine(&pool);
    completed(engine.run_sweep(EngineKind::Risk).await.expect("first sweep"));
    let second = completed(engine.run_sweep(EngineKind::Risk).await.expect("second sweep"));

    // flag already hard, stage 1 inside its 12h cooldown
    assert_eq!(second.flags_raised, 0);
    assert_eq!(second.escalations, 0);
    assert_eq!(count_events(&pool, task.id, "risk_flag_set").await, 1);
    assert_eq!(count_events(&pool, task.id, "escalation_stage1").await, 1);
    assert_eq!(count_notifications(&pool, "escalation_owner").await, 1);
}

#[tokio::test]
async fn test_hard_flag_propagates_to_waiting_dependent() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let upstream = Task::new(org_id, campaign.id, "Book venue", Utc::now() - Duration::hours(3))
        .with_status(TaskStatus::InProgress);
    seed_task(&pool, &upstream).await;

    let downstream = Task::new(
        org_id,
        campaign.id,
        "Send invites",
        Utc::now() + Duration::days(10),
    )
    .with_dependency(upstream.id);
    seed_task(&pool, &downstream).await;

    let stats = completed(engine(&pool).run_sweep(EngineKind::Risk).await.expect("sweep"));

    assert_eq!(stats.flags_raised, 1);
    assert_eq!(stats.propagations, 1);
    assert_eq!(stored_flag(&pool, upstream.id).await, "hard");
    assert_eq!(stored_flag(&pool, downstream.id).await, "soft");

    let origin: Option<String> = sqlx::query_scalar(
        "SELECT origin_task_id FROM task_events WHERE task_id = ? AND event_type = 'risk_propagated'",
    )
    .bind(downstream.id.to_string())
    .fetch_one(&pool)
    .await
    .expect("propagation event");
    assert_eq!(origin, Some(upstream.id.to_string()));
}

#[tokio::test]
async fn test_three_hard_flags_sink_the_campaign() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let sinking = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;
    let healthy = seed_campaign(&pool, org_id, "Autumn launch", Utc::now() + Duration::days(90)).await;

    for name in ["Venue", "Catering", "AV setup"] {
        let task = Task::new(org_id, sinking.id, name, Utc::now() - Duration::hours(1))
            .with_status(TaskStatus::InProgress);
        seed_task(&pool, &task).await;
    }
    let fine = Task::new(org_id, healthy.id, "Kickoff deck", Utc::now() + Duration::days(60));
    seed_task(&pool, &fine).await;

    let stats = completed(engine(&pool).run_sweep(EngineKind::Risk).await.expect("sweep"));

    assert_eq!(stats.campaigns_updated, 1);
    assert_eq!(stored_campaign_status(&pool, sinking.id).await, "high_risk");
    assert_eq!(stored_campaign_status(&pool, healthy.id).await, "normal");
}

#[tokio::test]
async fn test_open_work_inside_launch_horizon_is_at_risk() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let campaign = seed_campaign(&pool, org_id, "Pop-up", Utc::now() + Duration::hours(24)).await;

    let task = Task::new(org_id, campaign.id, "Print flyers", Utc::now() + Duration::hours(20))
        .with_status(TaskStatus::InProgress);
    seed_task(&pool, &task).await;

    completed(engine(&pool).run_sweep(EngineKind::Risk).await.expect("sweep"));

    assert_eq!(stored_campaign_status(&pool, campaign.id).await, "at_risk");
}

#[tokio::test]
async fn test_foreign_lock_skips_the_run() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;
    let task = Task::new(org_id, campaign.id, "Order signage", Utc::now() - Duration::hours(2))
        .with_status(TaskStatus::InProgress);
    seed_task(&pool, &task).await;

    // another runner instance holds the risk lock
    let other_runner = SqliteSweepCoordinator::new(pool.clone(), 50);
    assert!(other_runner
        .try_acquire("risk_engine", StdDuration::from_secs(600))
        .await
        .expect("acquire"));

    let engine = engine(&pool);
    let outcome = engine.run_sweep(EngineKind::Risk).await.expect("sweep");
    assert_eq!(outcome, RunOutcome::LockHeld);
    assert_eq!(stored_flag(&pool, task.id).await, "none");

    other_runner.release("risk_engine").await.expect("release");
    completed(engine.run_sweep(EngineKind::Risk).await.expect("sweep after release"));
    assert_eq!(stored_flag(&pool, task.id).await, "hard");
}

#[tokio::test]
async fn test_event_mode_touches_only_the_named_tenant() {
    let pool = setup_pool().await;

    let org_a = seed_org(&pool, "Org A").await;
    let campaign_a = seed_campaign(&pool, org_a, "A launch", Utc::now() + Duration::days(30)).await;
    let task_a = Task::new(org_a, campaign_a.id, "A task", Utc::now() - Duration::hours(2));
    seed_task(&pool, &task_a).await;

    let org_b = seed_org(&pool, "Org B").await;
    let campaign_b = seed_campaign(&pool, org_b, "B launch", Utc::now() + Duration::days(30)).await;
    let task_b = Task::new(org_b, campaign_b.id, "B task", Utc::now() - Duration::hours(2))
        .with_status(TaskStatus::InProgress);
    seed_task(&pool, &task_b).await;

    // the host flow: a status mutation followed by an immediate tenant run
    SqliteTaskRepository::new(pool.clone())
        .update_status(org_a, task_a.id, TaskStatus::InProgress)
        .await
        .expect("status update");

    let stats = completed(
        engine(&pool)
            .run_for_tenant(EngineKind::Risk, org_a)
            .await
            .expect("tenant run"),
    );

    assert_eq!(stats.tenants_processed, 1);
    assert_eq!(stored_flag(&pool, task_a.id).await, "hard");
    assert_eq!(stored_flag(&pool, task_b.id).await, "none");
}

#[tokio::test]
async fn test_cursor_pages_through_tenants_and_wraps() {
    let pool = setup_pool().await;

    let mut task_ids = Vec::new();
    for name in ["Org A", "Org B"] {
        let org_id = seed_org(&pool, name).await;
        let campaign = seed_campaign(&pool, org_id, "Launch", Utc::now() + Duration::days(30)).await;
        let task = Task::new(org_id, campaign.id, "Late task", Utc::now() - Duration::hours(2))
            .with_status(TaskStatus::InProgress);
        seed_task(&pool, &task).await;
        task_ids.push(task.id);
    }

    let engine = engine_with_page_size(&pool, 1);

    completed(engine.run_sweep(EngineKind::Risk).await.expect("first page"));
    let mut hard = 0;
    for &task_id in &task_ids {
        if stored_flag(&pool, task_id).await == "hard" {
            hard += 1;
        }
    }
    assert_eq!(hard, 1, "first page should cover exactly one tenant");

    completed(engine.run_sweep(EngineKind::Risk).await.expect("second page"));
    for &task_id in &task_ids {
        assert_eq!(stored_flag(&pool, task_id).await, "hard");
    }

    // the full page after org B signals more might follow; the next (empty)
    // page wraps the cursor back to the start
    completed(engine.run_sweep(EngineKind::Risk).await.expect("wrap run"));
    let cursor = SqliteSweepCoordinator::new(pool.clone(), 1)
        .read_cursor("risk_engine")
        .await
        .expect("cursor");
    assert_eq!(cursor.last_org_id, None);
}

#[tokio::test]
async fn test_upcoming_reminder_fires_once_per_window() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let owner = seed_member(&pool, org_id, "member").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let task = Task::new(org_id, campaign.id, "Confirm caterer", Utc::now() + Duration::hours(24))
        .with_status(TaskStatus::InProgress)
        .with_assignee(owner);
    seed_task(&pool, &task).await;

    let engine = engine(&pool);
    let first = completed(engine.run_sweep(EngineKind::Reminders).await.expect("first"));
    assert_eq!(first.reminders_sent, 1);
    assert_eq!(count_notifications(&pool, "reminder_upcoming").await, 1);

    let second = completed(engine.run_sweep(EngineKind::Reminders).await.expect("second"));
    assert_eq!(second.reminders_sent, 0);
    assert_eq!(count_notifications(&pool, "reminder_upcoming").await, 1);
    assert_eq!(count_events(&pool, task.id, "reminder_sent").await, 1);
}

#[tokio::test]
async fn test_overdue_reminder_hardens_flag_and_keeps_firing() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let owner = seed_member(&pool, org_id, "member").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let task = Task::new(org_id, campaign.id, "Ship swag", Utc::now() - Duration::hours(6))
        .with_status(TaskStatus::InProgress)
        .with_assignee(owner);
    seed_task(&pool, &task).await;

    let engine = engine(&pool);
    let first = completed(engine.run_sweep(EngineKind::Reminders).await.expect("first"));
    assert_eq!(first.reminders_sent, 1);
    assert_eq!(first.flags_raised, 1);
    assert_eq!(stored_flag(&pool, task.id).await, "hard");

    // no cooldown on overdue; flag already hard so it is not raised again
    let second = completed(engine.run_sweep(EngineKind::Reminders).await.expect("second"));
    assert_eq!(second.reminders_sent, 1);
    assert_eq!(second.flags_raised, 0);
    assert_eq!(count_notifications(&pool, "reminder_overdue").await, 2);
    assert_eq!(count_events(&pool, task.id, "risk_flag_set").await, 1);
}

#[tokio::test]
async fn test_unassigned_task_logs_escalation_without_notification() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let task = Task::new(org_id, campaign.id, "Unowned task", Utc::now() - Duration::hours(2))
        .with_status(TaskStatus::InProgress);
    seed_task(&pool, &task).await;

    let stats = completed(engine(&pool).run_sweep(EngineKind::Risk).await.expect("sweep"));

    assert_eq!(stats.escalations, 1);
    assert_eq!(count_events(&pool, task.id, "escalation_stage1").await, 1);
    assert_eq!(count_notifications(&pool, "escalation_owner").await, 0);
}

#[tokio::test]
async fn test_stage_two_reaches_all_managers() {
    let pool = setup_pool().await;
    let org_id = seed_org(&pool, "Acme Events").await;
    let owner = seed_member(&pool, org_id, "member").await;
    seed_member(&pool, org_id, "manager").await;
    seed_member(&pool, org_id, "manager").await;
    let campaign = seed_campaign(&pool, org_id, "Spring launch", Utc::now() + Duration::days(30)).await;

    let task = Task::new(org_id, campaign.id, "Order signage", Utc::now() - Duration::days(3))
        .with_status(TaskStatus::InProgress)
        .with_assignee(owner);
    seed_task(&pool, &task).await;

    // backdate a stage-1 firing so the ladder has something to measure from
    sqlx::query(
        "INSERT INTO task_events (id, org_id, task_id, actor_id, event_type, old_value, new_value, origin_task_id, recorded_at)
         VALUES (?, ?, ?, ?, 'escalation_stage1', NULL, 'hard', NULL, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(org_id.to_string())
    .bind(task.id.to_string())
    .bind(Uuid::nil().to_string())
    .bind((Utc::now() - Duration::hours(30)).to_rfc3339())
    .execute(&pool)
    .await
    .expect("seed stage 1 event");

    let stats = completed(engine(&pool).run_sweep(EngineKind::Risk).await.expect("sweep"));

    assert_eq!(stats.escalations, 1);
    assert_eq!(count_events(&pool, task.id, "escalation_stage2").await, 1);
    assert_eq!(count_notifications(&pool, "escalation_manager").await, 2);
    assert_eq!(count_notifications(&pool, "escalation_owner").await, 0);
}
