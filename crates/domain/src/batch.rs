//! Stock batch entity.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use common::{BatchRef, Sku};

use crate::order_line::OrderLine;

/// A lot of stock of one sku with a purchase quantity and an optional
/// arrival date.
///
/// Entity: identity is the reference alone. Equality and hashing ignore
/// every other field, so a reloaded batch compares equal to the in-memory
/// one it was cloned from.
///
/// Batches are ordered for allocation by eta: in-stock batches (no eta)
/// come first, then earlier arrivals. That ordering is a sort key
/// ([`Batch::eta`]) rather than an `Ord` impl, so it cannot disagree with
/// the identity-based equality.
#[derive(Debug, Clone)]
pub struct Batch {
    reference: BatchRef,
    sku: Sku,
    eta: Option<NaiveDate>,
    purchased_quantity: u32,
    allocations: HashSet<OrderLine>,
}

impl Batch {
    /// Creates a new batch with no allocations.
    pub fn new(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        quantity: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            eta,
            purchased_quantity: quantity,
            allocations: HashSet::new(),
        }
    }

    /// Returns the identity reference of this batch.
    pub fn reference(&self) -> &BatchRef {
        &self.reference
    }

    /// Returns the sku this batch holds stock for.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the expected arrival date, or `None` for warehouse stock.
    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    /// Returns the purchased quantity.
    pub fn purchased_quantity(&self) -> u32 {
        self.purchased_quantity
    }

    /// Returns the total quantity currently allocated to order lines.
    pub fn allocated_quantity(&self) -> i64 {
        self.allocations
            .iter()
            .map(|line| i64::from(line.quantity()))
            .sum()
    }

    /// Returns the quantity still available for allocation.
    ///
    /// May be negative after a purchased-quantity reduction, until the
    /// owning product deallocates enough lines to compensate.
    pub fn available_quantity(&self) -> i64 {
        i64::from(self.purchased_quantity) - self.allocated_quantity()
    }

    /// Returns whether this batch can satisfy the given line.
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        self.sku == *line.sku() && self.available_quantity() >= i64::from(line.quantity())
    }

    /// Returns the order lines currently allocated to this batch.
    pub fn allocations(&self) -> impl Iterator<Item = &OrderLine> {
        self.allocations.iter()
    }

    /// Returns whether the given line is allocated to this batch.
    pub fn holds(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    pub(crate) fn set_purchased_quantity(&mut self, quantity: u32) {
        self.purchased_quantity = quantity;
    }

    /// Adds the line to the allocation set if the batch can satisfy it.
    /// Idempotent for an identical line (set semantics).
    pub(crate) fn allocate(&mut self, line: OrderLine) {
        if self.can_allocate(&line) {
            self.allocations.insert(line);
        }
    }

    /// Removes and returns one allocation under a deterministic policy:
    /// largest quantity first, ties broken by smallest order ID.
    /// Returns `None` when nothing is allocated.
    pub(crate) fn deallocate_one(&mut self) -> Option<OrderLine> {
        let line = self
            .allocations
            .iter()
            .max_by(|a, b| {
                a.quantity()
                    .cmp(&b.quantity())
                    .then_with(|| b.order_id().cmp(a.order_id()))
            })
            .cloned()?;
        self.allocations.take(&line)
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Batch {}

impl Hash for Batch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}
