use crate::domain::errors::DomainResult;
use crate::domain::models::Notification;
use async_trait::async_trait;

/// Port for handing finished notifications to the delivery side
///
/// The engine decides who gets told what; transports (inbox rows today,
/// push or email later) live behind this trait.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    async fn deliver(&self, notification: &Notification) -> DomainResult<()>;
}
