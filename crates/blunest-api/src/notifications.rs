//! In-app notifications
//!
//! Notifications are stored first and then pushed to live subscribers over a
//! broadcast channel. A subscriber that falls behind skips what it missed; the
//! rows stay readable through the list endpoint.

use blunest_db::entities::notification;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Notification;

/// Buffered events per subscriber before it starts lagging
pub const HUB_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Push to live subscribers; returns how many received it
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(HUB_CAPACITY)
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            kind: kind.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Store a notification and push it to the recipient's open streams
pub async fn notify<C: ConnectionTrait>(
    db: &C,
    hub: &NotificationHub,
    new: NewNotification,
) -> Result<Notification, DbErr> {
    let model = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        title: Set(new.title),
        message: Set(new.message),
        kind: Set(new.kind),
        link: Set(new.link),
        is_read: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    let notification = Notification::from(model);
    let receivers = hub.publish(notification.clone());
    debug!(
        "Notification {} for user {} pushed to {} stream(s)",
        notification.id, notification.user_id, receivers
    );

    Ok(notification)
}

/// Like [`notify`] but only logs failures; for side effects after a commit
pub async fn notify_quietly<C: ConnectionTrait>(db: &C, hub: &NotificationHub, new: NewNotification) {
    let user_id = new.user_id;
    if let Err(e) = notify(db, hub, new).await {
        warn!("Failed to store notification for user {}: {}", user_id, e);
    }
}
