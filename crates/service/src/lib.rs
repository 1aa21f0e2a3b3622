//! Service layer for the allocation service.
//!
//! This crate owns the orchestration triad around the domain model:
//! - [`unit_of_work`] — the transaction scope that bounds one set of
//!   aggregate mutations and harvests the events they raise
//! - [`messagebus`] — the FIFO dispatch loop routing commands and
//!   events to registered handlers, with bounded retry for event
//!   handlers and a cap on runaway cascades
//! - [`handlers`] — the use cases wired in by [`bootstrap`]
//!
//! External collaborators (notifications, event transport, read model)
//! are injected as `adapters` ports at the composition root.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod messagebus;
pub mod unit_of_work;
pub mod views;

pub use bootstrap::{bootstrap, default_registry};
pub use config::BusConfig;
pub use error::{Result, ServiceError};
pub use messagebus::{CommandHandler, EventHandler, HandlerFuture, HandlerRegistry, MessageBus};
pub use unit_of_work::{InMemoryUnitOfWork, UnitOfWork};
