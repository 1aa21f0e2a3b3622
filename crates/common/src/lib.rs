//! Shared types for the allocation service.

pub mod types;

pub use types::{BatchRef, OrderId, Sku, Version};
