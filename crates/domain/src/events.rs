//! Domain events raised by the product aggregate.

use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use crate::order_line::OrderLine;

/// Events describing something that happened in the allocation domain.
///
/// Events have zero-or-more handlers and no return value; failures in
/// their handlers are contained by the message bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// An order line was allocated to a batch.
    Allocated(AllocatedData),

    /// An order line lost its allocation and needs a fresh attempt.
    Deallocated(DeallocatedData),

    /// No batch could satisfy an order line for this sku.
    OutOfStock(OutOfStockData),
}

/// Discriminant of an [`Event`], used as the handler-registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Allocated,
    Deallocated,
    OutOfStock,
}

impl EventKind {
    /// Returns the event type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Allocated => "Allocated",
            EventKind::Deallocated => "Deallocated",
            EventKind::OutOfStock => "OutOfStock",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Returns the discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Allocated(_) => EventKind::Allocated,
            Event::Deallocated(_) => EventKind::Deallocated,
            Event::OutOfStock(_) => EventKind::OutOfStock,
        }
    }

    /// Builds an `Allocated` event for a line and the batch that took it.
    pub fn allocated(line: &OrderLine, batchref: BatchRef) -> Self {
        Event::Allocated(AllocatedData {
            order_id: line.order_id().clone(),
            sku: line.sku().clone(),
            quantity: line.quantity(),
            batchref,
        })
    }

    /// Builds a `Deallocated` event for a line that lost its batch.
    pub fn deallocated(line: &OrderLine) -> Self {
        Event::Deallocated(DeallocatedData {
            order_id: line.order_id().clone(),
            sku: line.sku().clone(),
            quantity: line.quantity(),
        })
    }

    /// Builds an `OutOfStock` event for a sku.
    pub fn out_of_stock(sku: Sku) -> Self {
        Event::OutOfStock(OutOfStockData { sku })
    }
}

/// Data for the Allocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedData {
    /// The order the allocated line belongs to.
    pub order_id: OrderId,

    /// The sku that was allocated.
    pub sku: Sku,

    /// The quantity that was allocated.
    pub quantity: u32,

    /// The batch the line was allocated to.
    pub batchref: BatchRef,
}

/// Data for the Deallocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeallocatedData {
    /// The order the deallocated line belongs to.
    pub order_id: OrderId,

    /// The sku that lost its allocation.
    pub sku: Sku,

    /// The quantity that must be re-allocated.
    pub quantity: u32,
}

impl DeallocatedData {
    /// Rebuilds the order line this event describes.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.order_id.clone(), self.sku.clone(), self.quantity)
    }
}

/// Data for the OutOfStock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStockData {
    /// The sku that ran out of stock.
    pub sku: Sku,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_names() {
        let line = OrderLine::new("order-1", "LAMP", 2);
        assert_eq!(
            Event::allocated(&line, BatchRef::new("batch-001")).kind(),
            EventKind::Allocated
        );
        assert_eq!(Event::deallocated(&line).kind(), EventKind::Deallocated);
        assert_eq!(
            Event::out_of_stock(Sku::new("LAMP")).kind(),
            EventKind::OutOfStock
        );
        assert_eq!(EventKind::OutOfStock.as_str(), "OutOfStock");
    }

    #[test]
    fn allocated_event_carries_the_line_fields() {
        let line = OrderLine::new("order-1", "LAMP", 2);
        let Event::Allocated(data) = Event::allocated(&line, BatchRef::new("batch-001")) else {
            panic!("expected Allocated");
        };
        assert_eq!(data.order_id, OrderId::new("order-1"));
        assert_eq!(data.sku, Sku::new("LAMP"));
        assert_eq!(data.quantity, 2);
        assert_eq!(data.batchref, BatchRef::new("batch-001"));
    }

    #[test]
    fn deallocated_event_rebuilds_its_line() {
        let line = OrderLine::new("order-1", "LAMP", 2);
        let Event::Deallocated(data) = Event::deallocated(&line) else {
            panic!("expected Deallocated");
        };
        assert_eq!(data.line(), line);
    }

    #[test]
    fn serialization_is_tagged() {
        let event = Event::out_of_stock(Sku::new("LAMP"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OutOfStock");
        assert_eq!(json["data"]["sku"], "LAMP");

        let roundtrip: Event = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, event);
    }
}
