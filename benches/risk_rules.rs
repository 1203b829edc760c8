//! Benchmarks for the pure risk rules.
//!
//! The sweep evaluates every open task of a tenant against that tenant's
//! indexed event history, then runs propagation and aggregation over the
//! results, so these are the hot paths of a run. The history index build
//! happens once per tenant per sweep.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use vigil::domain::models::{Campaign, RiskFlag, Task, TaskEvent, TaskStatus};
use vigil::services::{assess_campaign, evaluate_task, propagate_risk, EventHistory, TaskRiskView};

/// Linear dependency chain with a hard flag at the root.
fn chain(len: usize) -> (HashMap<Uuid, Task>, HashMap<Uuid, RiskFlag>) {
    let org_id = Uuid::new_v4();
    let campaign_id = Uuid::new_v4();
    let now = Utc::now();

    let mut tasks = HashMap::with_capacity(len);
    let mut effective = HashMap::with_capacity(len);
    let mut previous: Option<Uuid> = None;
    for i in 0..len {
        let mut task = Task::new(
            org_id,
            campaign_id,
            format!("task-{i}"),
            now + Duration::days(30),
        );
        if i == 0 {
            task = task.with_status(TaskStatus::InProgress);
            task.risk_flag = RiskFlag::Hard;
        }
        if let Some(dep) = previous {
            task = task.with_dependency(dep);
        }
        previous = Some(task.id);
        effective.insert(task.id, task.risk_flag);
        tasks.insert(task.id, task);
    }
    (tasks, effective)
}

fn status_events(count: usize) -> Vec<TaskEvent> {
    let org_id = Uuid::new_v4();
    let now = Utc::now();
    (0..count)
        .map(|i| {
            TaskEvent::status_changed(
                org_id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                "not_started",
                if i % 2 == 0 { "in_progress" } else { "blocked" },
                now - Duration::minutes(i as i64),
            )
        })
        .collect()
}

fn risk_rules_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_rules");

    // Benchmark: single-task evaluation against an indexed history
    group.bench_function("evaluate_overdue_task", |b| {
        let now = Utc::now();
        let task = Task::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Late task",
            now - Duration::hours(2),
        )
        .with_status(TaskStatus::InProgress);
        let history = EventHistory::from_events(&status_events(256));

        b.iter(|| black_box(evaluate_task(&task, &history, now)));
    });

    // Benchmark: history index build for growing tenant logs
    for event_count in [100, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("history_from_events", event_count),
            &event_count,
            |b, &event_count| {
                let events = status_events(event_count);
                b.iter(|| black_box(EventHistory::from_events(&events)));
            },
        );
    }

    // Benchmark: propagation over dependency chains
    for chain_len in [10, 100, 1_000] {
        group.bench_with_input(
            BenchmarkId::new("propagate_chain", chain_len),
            &chain_len,
            |b, &chain_len| {
                let (tasks, effective) = chain(chain_len);
                b.iter(|| black_box(propagate_risk(&tasks, &effective)));
            },
        );
    }

    // Benchmark: campaign aggregation across task counts
    for task_count in [10, 100, 1_000] {
        group.bench_with_input(
            BenchmarkId::new("assess_campaign", task_count),
            &task_count,
            |b, &task_count| {
                let now = Utc::now();
                let campaign = Campaign::new(Uuid::new_v4(), "Launch", now + Duration::days(30));
                let views: Vec<TaskRiskView> = (0..task_count)
                    .map(|i| TaskRiskView {
                        status: TaskStatus::InProgress,
                        flag: if i % 7 == 0 { RiskFlag::Soft } else { RiskFlag::None },
                    })
                    .collect();
                b.iter(|| black_box(assess_campaign(&campaign, &views, now)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, risk_rules_benchmark);
criterion_main!(benches);
