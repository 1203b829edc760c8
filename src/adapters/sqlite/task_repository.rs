//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{RiskFlag, Task, TaskStatus};
use crate::domain::ports::TaskRepository;

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO tasks (id, org_id, campaign_id, dependency_id, name, status,
               risk_flag, assignee_id, assigned_at, due_date, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(task.id.to_string())
        .bind(task.org_id.to_string())
        .bind(task.campaign_id.to_string())
        .bind(task.dependency_id.map(|id| id.to_string()))
        .bind(&task.name)
        .bind(task.status.as_str())
        .bind(task.risk_flag.as_str())
        .bind(task.assignee_id.map(|id| id.to_string()))
        .bind(task.assigned_at.map(|t| t.to_rfc3339()))
        .bind(task.due_date.to_rfc3339())
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, org_id: Uuid, task_id: Uuid) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE org_id = ? AND id = ?")
            .bind(org_id.to_string())
            .bind(task_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }

    async fn list_by_org(&self, org_id: Uuid) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks WHERE org_id = ? ORDER BY id")
                .bind(org_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_status(
        &self,
        org_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
    ) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE tasks SET status = ?, updated_at = ? WHERE org_id = ? AND id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(org_id.to_string())
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(task_id));
        }

        Ok(())
    }

    async fn set_risk_flag(&self, org_id: Uuid, task_id: Uuid, flag: RiskFlag) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE tasks SET risk_flag = ?, updated_at = ? WHERE org_id = ? AND id = ?",
        )
        .bind(flag.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(org_id.to_string())
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(task_id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    org_id: String,
    campaign_id: String,
    dependency_id: Option<String>,
    name: String,
    status: String,
    risk_flag: String,
    assignee_id: Option<String>,
    assigned_at: Option<String>,
    due_date: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;
        let risk_flag = RiskFlag::from_str(&row.risk_flag).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid risk flag: {}", row.risk_flag))
        })?;

        Ok(Task {
            id: parse_uuid(&row.id)?,
            org_id: parse_uuid(&row.org_id)?,
            campaign_id: parse_uuid(&row.campaign_id)?,
            dependency_id: parse_optional_uuid(row.dependency_id)?,
            name: row.name,
            status,
            risk_flag,
            assignee_id: parse_optional_uuid(row.assignee_id)?,
            assigned_at: parse_optional_datetime(row.assigned_at)?,
            due_date: parse_datetime(&row.due_date)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
