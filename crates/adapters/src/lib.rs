//! Collaborator ports for the allocation service and their in-process
//! implementations.
//!
//! Each port is an `#[async_trait]` trait owned by this crate:
//! - [`Repository`] — loads and saves [`domain::Product`] aggregates,
//!   tracking what it hands out so the unit of work can harvest events
//! - [`Notifications`] — out-of-band notification sink
//! - [`EventPublisher`] — fire-and-forget event transport
//! - [`AllocationsView`] — denormalized allocations read model
//!
//! The in-memory implementations are complete, not stubs: the repository
//! enforces optimistic concurrency at commit time the same way a
//! row-versioned database would.

pub mod notifications;
pub mod publisher;
pub mod read_model;
pub mod repository;

pub use notifications::{
    InMemoryNotifications, LoggingNotifications, NotificationError, Notifications,
};
pub use publisher::{EventPublisher, InMemoryEventPublisher, LoggingEventPublisher, PublishError};
pub use read_model::{AllocationRecord, AllocationsView, InMemoryAllocationsView, ReadModelError};
pub use repository::{
    InMemoryRepository, ProductRef, ProductStore, Repository, RepositoryError,
};
