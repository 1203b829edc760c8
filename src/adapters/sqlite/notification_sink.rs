//! SQLite implementation of the notification sink.
//!
//! Writes inbox rows that the surrounding product surfaces to users. This is
//! the only notification transport today.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::Notification;
use crate::domain::ports::NotificationSink;

#[derive(Clone)]
pub struct SqliteNotificationSink {
    pool: SqlitePool,
}

impl SqliteNotificationSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for SqliteNotificationSink {
    async fn deliver(&self, notification: &Notification) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO notifications (id, org_id, recipient_id, task_id, campaign_id,
               kind, message, read, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(notification.id.to_string())
        .bind(notification.org_id.to_string())
        .bind(notification.recipient_id.to_string())
        .bind(notification.task_id.map(|id| id.to_string()))
        .bind(notification.campaign_id.map(|id| id.to_string()))
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
