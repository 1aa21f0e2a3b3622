//! Domain model for the allocation service.
//!
//! This crate provides the core domain abstractions:
//! - `OrderLine` value object and `Batch` entity
//! - `Product` aggregate root owning the allocation algorithm and the
//!   optimistic-concurrency version counter
//! - `Command`/`Event` message variants and the `Message` sum type
//!   consumed by the message bus
//!
//! The domain layer is pure: no I/O, no async, no clock. Side effects are
//! expressed as events buffered on the aggregate and harvested by the
//! unit of work.

pub mod batch;
pub mod commands;
pub mod error;
pub mod events;
pub mod message;
pub mod order_line;
pub mod product;

pub use batch::Batch;
pub use commands::{
    AllocateData, ChangeBatchQuantityData, Command, CommandKind, CreateBatchData,
};
pub use error::DomainError;
pub use events::{AllocatedData, DeallocatedData, Event, EventKind, OutOfStockData};
pub use message::Message;
pub use order_line::OrderLine;
pub use product::Product;
