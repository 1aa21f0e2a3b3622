//! Notification sink port.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by a notification transport.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The transport failed to deliver the message.
    #[error("notification delivery to {destination} failed: {reason}")]
    Delivery { destination: String, reason: String },
}

/// Port for out-of-band notifications (e.g. the out-of-stock mail).
#[async_trait]
pub trait Notifications: Send + Sync {
    /// Sends a message to a destination address.
    async fn send(&self, destination: &str, message: &str) -> Result<(), NotificationError>;
}

/// Notification sink that writes to the tracing log.
///
/// The default sink when no real transport is wired in at the
/// composition root.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifications;

impl LoggingNotifications {
    /// Creates a new logging sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifications for LoggingNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<(), NotificationError> {
        tracing::info!(destination, message, "notification sent");
        Ok(())
    }
}

/// Records notifications in memory for inspection during tests.
#[derive(Debug, Default)]
pub struct InMemoryNotifications {
    sent: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryNotifications {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every message sent to a destination, in send order.
    pub async fn sent_to(&self, destination: &str) -> Vec<String> {
        self.sent
            .read()
            .await
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the total number of messages recorded.
    pub async fn len(&self) -> usize {
        self.sent.read().await.values().map(Vec::len).sum()
    }

    /// Returns whether nothing has been sent.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Notifications for InMemoryNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<(), NotificationError> {
        self.sent
            .write()
            .await
            .entry(destination.to_string())
            .or_default()
            .push(message.to_string());
        Ok(())
    }
}
