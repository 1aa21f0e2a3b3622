//! Product aggregate root.

use common::{BatchRef, Sku, Version};

use crate::batch::Batch;
use crate::error::DomainError;
use crate::events::Event;
use crate::order_line::OrderLine;

/// Aggregate root for one sku: the consistency boundary around its
/// batches.
///
/// All mutation goes through [`Product::add_batch`],
/// [`Product::allocate`] and [`Product::change_batch_quantity`]; batches
/// are never mutated directly from outside.
///
/// `version_number` is the optimistic-concurrency token. It increments
/// once per successful allocation, and the storage adapter compares it
/// against the persisted value at commit time; a mismatch fails the
/// enclosing transaction rather than silently overwriting.
///
/// Domain decisions that concern the outside world are buffered as
/// [`Event`]s and drained by the unit of work after each transaction.
#[derive(Debug, Clone)]
pub struct Product {
    sku: Sku,
    batches: Vec<Batch>,
    version_number: Version,
    events: Vec<Event>,
}

impl Product {
    /// Creates a product with no batches at version 0.
    pub fn new(sku: impl Into<Sku>) -> Self {
        Self {
            sku: sku.into(),
            batches: Vec::new(),
            version_number: Version::initial(),
            events: Vec::new(),
        }
    }

    /// Returns the sku this product aggregates stock for.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the optimistic-concurrency version.
    pub fn version_number(&self) -> Version {
        self.version_number
    }

    /// Returns the batches owned by this product. Order is incidental;
    /// allocation sorts by eta at decision time.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Looks up a batch by reference.
    pub fn batch(&self, reference: &BatchRef) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference() == reference)
    }

    /// Returns the events raised since the last drain, without clearing.
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    /// Drains and returns the pending events, clearing the buffer.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Registers a new batch under this product.
    ///
    /// Every batch of a product carries the product's sku; a mismatch is
    /// a [`DomainError::SkuMismatch`].
    pub fn add_batch(&mut self, batch: Batch) -> Result<(), DomainError> {
        if *batch.sku() != self.sku {
            return Err(DomainError::SkuMismatch {
                reference: batch.reference().clone(),
                batch_sku: batch.sku().clone(),
                product_sku: self.sku.clone(),
            });
        }
        self.batches.push(batch);
        Ok(())
    }

    /// Allocates an order line to the preferred batch.
    ///
    /// Preference is warehouse stock first (no eta), then earliest eta;
    /// among equals, the earliest-registered batch wins. On success the
    /// version increments by one, an `Allocated` event is buffered and
    /// the chosen batch's reference is returned.
    ///
    /// When no batch can satisfy the line, an `OutOfStock` event is
    /// buffered and `None` is returned. `None` is a signal, not a fault:
    /// it flows to a notification rather than back to the caller as an
    /// error, and the version stays unchanged.
    pub fn allocate(&mut self, line: OrderLine) -> Option<BatchRef> {
        let best = self
            .batches
            .iter()
            .enumerate()
            .filter(|(_, batch)| batch.can_allocate(&line))
            .min_by_key(|(_, batch)| batch.eta())
            .map(|(index, _)| index);

        match best {
            Some(index) => {
                let batch = &mut self.batches[index];
                batch.allocate(line.clone());
                let reference = batch.reference().clone();
                self.version_number = self.version_number.next();
                self.events.push(Event::allocated(&line, reference.clone()));
                Some(reference)
            }
            None => {
                self.events.push(Event::out_of_stock(self.sku.clone()));
                None
            }
        }
    }

    /// Sets a batch's purchased quantity to a new absolute value and
    /// deallocates lines while the batch is over-committed.
    ///
    /// Each removed line is buffered as a `Deallocated` event, to be
    /// re-processed by the bus as a fresh allocation attempt (possibly
    /// landing on a different batch, or back on this one). Removal order
    /// is deterministic: largest quantity first, ties broken by smallest
    /// order ID.
    pub fn change_batch_quantity(
        &mut self,
        reference: &BatchRef,
        quantity: u32,
    ) -> Result<(), DomainError> {
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.reference() == reference)
            .ok_or_else(|| DomainError::BatchNotFound {
                reference: reference.clone(),
            })?;

        batch.set_purchased_quantity(quantity);
        while batch.available_quantity() < 0 {
            let Some(line) = batch.deallocate_one() else {
                break;
            };
            self.events.push(Event::deallocated(&line));
        }
        Ok(())
    }
}
