//! Service-layer error types.

use adapters::{NotificationError, PublishError, ReadModelError, RepositoryError};
use common::{BatchRef, Sku};
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur while handling a message.
///
/// Faults on the command path propagate to the external caller; faults
/// on the event path are retried and then contained by the bus.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A message referenced a sku with no known product.
    #[error("invalid sku {0}")]
    InvalidSku(Sku),

    /// A command referenced a batch no product contains.
    #[error("unknown batch {0}")]
    UnknownBatch(BatchRef),

    /// The storage adapter rejected an operation. Includes the
    /// commit-time concurrency conflict, passed through untranslated so
    /// callers can decide whether to retry.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The aggregate rejected an operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A notification transport failed.
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// An event transport failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The read-model store failed.
    #[error(transparent)]
    ReadModel(#[from] ReadModelError),

    /// A queued command has no registered handler. Fatal: the drain
    /// loop aborts.
    #[error("no handler registered for {0}")]
    MissingHandler(&'static str),

    /// A handler was invoked with a message kind it does not accept.
    /// Signals a mis-wired registry.
    #[error("handler cannot process {0}")]
    UnexpectedMessage(&'static str),

    /// One dispatch produced more follow-on messages than the
    /// configured bound allows.
    #[error("cascade exceeded {limit} messages in one dispatch")]
    CascadeOverflow { limit: usize },
}

impl ServiceError {
    /// Returns whether this fault is a commit-time concurrency conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            ServiceError::Repository(RepositoryError::ConcurrencyConflict { .. })
        )
    }
}

/// Result type for service-layer operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
