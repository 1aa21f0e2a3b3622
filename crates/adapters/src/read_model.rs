//! Allocations read model port.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use common::{BatchRef, OrderId, Sku};

/// Errors surfaced by the read-model store.
#[derive(Debug, Error)]
pub enum ReadModelError {
    /// The backing store rejected the operation.
    #[error("read model update failed: {0}")]
    Storage(String),
}

/// One row of the denormalized allocations view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationRecord {
    /// The order the allocated line belongs to.
    pub order_id: OrderId,

    /// The allocated sku.
    pub sku: Sku,

    /// The batch the line was allocated to.
    pub batchref: BatchRef,
}

/// Port for the allocations read model, kept current by the
/// `Allocated`/`Deallocated` event handlers.
#[async_trait]
pub trait AllocationsView: Send + Sync {
    /// Upserts the row for (order, sku).
    async fn add(&self, record: AllocationRecord) -> Result<(), ReadModelError>;

    /// Removes the row for (order, sku), if present.
    async fn remove(&self, order_id: &OrderId, sku: &Sku) -> Result<(), ReadModelError>;

    /// Returns every allocation row for an order.
    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<AllocationRecord>, ReadModelError>;
}

/// In-memory allocations view.
#[derive(Debug, Default)]
pub struct InMemoryAllocationsView {
    rows: RwLock<Vec<AllocationRecord>>,
}

impl InMemoryAllocationsView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns whether the view holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl AllocationsView for InMemoryAllocationsView {
    async fn add(&self, record: AllocationRecord) -> Result<(), ReadModelError> {
        let mut rows = self.rows.write().await;
        rows.retain(|row| !(row.order_id == record.order_id && row.sku == record.sku));
        rows.push(record);
        Ok(())
    }

    async fn remove(&self, order_id: &OrderId, sku: &Sku) -> Result<(), ReadModelError> {
        self.rows
            .write()
            .await
            .retain(|row| !(row.order_id == *order_id && row.sku == *sku));
        Ok(())
    }

    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<AllocationRecord>, ReadModelError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.order_id == *order_id)
            .cloned()
            .collect())
    }
}
