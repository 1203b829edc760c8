//! SQLite implementation of the append-only task event log.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskEvent, TaskEventType};
use crate::domain::ports::TaskEventLog;

#[derive(Clone)]
pub struct SqliteTaskEventLog {
    pool: SqlitePool,
}

impl SqliteTaskEventLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskEventLog for SqliteTaskEventLog {
    async fn append(&self, event: &TaskEvent) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO task_events (id, org_id, task_id, actor_id, event_type,
               old_value, new_value, origin_task_id, recorded_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(event.id.to_string())
        .bind(event.org_id.to_string())
        .bind(event.task_id.to_string())
        .bind(event.actor_id.to_string())
        .bind(event.event_type.as_str())
        .bind(&event.old_value)
        .bind(&event.new_value)
        .bind(event.origin_task_id.map(|id| id.to_string()))
        .bind(event.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_org(&self, org_id: Uuid) -> DomainResult<Vec<TaskEvent>> {
        let rows: Vec<TaskEventRow> = sqlx::query_as(
            "SELECT * FROM task_events WHERE org_id = ? ORDER BY recorded_at, id",
        )
        .bind(org_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskEvent::try_from).collect()
    }

    async fn list_by_task(&self, org_id: Uuid, task_id: Uuid) -> DomainResult<Vec<TaskEvent>> {
        let rows: Vec<TaskEventRow> = sqlx::query_as(
            "SELECT * FROM task_events WHERE org_id = ? AND task_id = ? ORDER BY recorded_at, id",
        )
        .bind(org_id.to_string())
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskEvent::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TaskEventRow {
    id: String,
    org_id: String,
    task_id: String,
    actor_id: String,
    event_type: String,
    old_value: Option<String>,
    new_value: Option<String>,
    origin_task_id: Option<String>,
    recorded_at: String,
}

impl TryFrom<TaskEventRow> for TaskEvent {
    type Error = DomainError;

    fn try_from(row: TaskEventRow) -> Result<Self, Self::Error> {
        let event_type = TaskEventType::from_str(&row.event_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid event type: {}", row.event_type))
        })?;

        Ok(TaskEvent {
            id: parse_uuid(&row.id)?,
            org_id: parse_uuid(&row.org_id)?,
            task_id: parse_uuid(&row.task_id)?,
            actor_id: parse_uuid(&row.actor_id)?,
            event_type,
            old_value: row.old_value,
            new_value: row.new_value,
            origin_task_id: parse_optional_uuid(row.origin_task_id)?,
            recorded_at: parse_datetime(&row.recorded_at)?,
        })
    }
}
