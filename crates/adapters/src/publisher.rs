//! Event publisher port.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use domain::Event;

/// Errors surfaced by an event transport.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The event could not be serialized for the wire.
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport rejected the publish.
    #[error("publish to channel {channel} failed: {reason}")]
    Transport { channel: String, reason: String },
}

/// Port for publishing domain events to an external transport.
///
/// Publishing is fire-and-forget from the bus's point of view: the bus
/// does not retry publishes; a transport that needs reliability owns its
/// own retry.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event to a named channel.
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), PublishError>;
}

/// Publishes events to the tracing log as JSON.
///
/// Useful in development and as the default transport when no broker is
/// wired in.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    /// Creates a new logging publisher.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(channel, event = %event.kind(), %payload, "event published");
        Ok(())
    }
}

/// Collects published events in memory for inspection during tests.
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    published: RwLock<Vec<(String, Event)>>,
}

impl InMemoryEventPublisher {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every published (channel, event) pair, in publish order.
    pub async fn published(&self) -> Vec<(String, Event)> {
        self.published.read().await.clone()
    }

    /// Returns the events published to one channel.
    pub async fn on_channel(&self, channel: &str) -> Vec<Event> {
        self.published
            .read()
            .await
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), PublishError> {
        self.published
            .write()
            .await
            .push((channel.to_string(), event.clone()));
        Ok(())
    }
}
