//! Read-side queries.

use adapters::{AllocationRecord, AllocationsView, ReadModelError};
use common::OrderId;

/// Returns the current allocations for an order, straight from the
/// denormalized view — no aggregate is loaded.
pub async fn allocations(
    order_id: &OrderId,
    view: &dyn AllocationsView,
) -> Result<Vec<AllocationRecord>, ReadModelError> {
    view.for_order(order_id).await
}
