//! Order line value object.

use common::{OrderId, Sku};
use serde::{Deserialize, Serialize};

/// A customer's request for a quantity of one sku under one order.
///
/// Value object: immutable once constructed, compared and hashed by
/// value. Two lines with the same order, sku and quantity are the same
/// line; allocating one of them twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLine {
    order_id: OrderId,
    sku: Sku,
    quantity: u32,
}

impl OrderLine {
    /// Creates a new order line. Quantity is expected to be positive.
    pub fn new(order_id: impl Into<OrderId>, sku: impl Into<Sku>, quantity: u32) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            quantity,
        }
    }

    /// Returns the order this line belongs to.
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Returns the sku being ordered.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the quantity being ordered.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}
