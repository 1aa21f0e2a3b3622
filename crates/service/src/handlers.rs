//! Message handlers: the use cases of the allocation service.
//!
//! Command handlers run inside a unit-of-work transaction and commit
//! explicitly; the bus closes the scope afterwards, so a fault between
//! mutation and commit rolls everything back. Event handlers react to
//! facts and may open transactions of their own.

use adapters::{AllocationRecord, AllocationsView, EventPublisher, Notifications, Repository};
use common::BatchRef;
use domain::{
    AllocateData, AllocatedData, Batch, ChangeBatchQuantityData, CreateBatchData, DeallocatedData,
    Event, OutOfStockData, Product,
};

use crate::error::{Result, ServiceError};
use crate::unit_of_work::UnitOfWork;

/// Channel the allocated-line events are published on.
pub const LINE_ALLOCATED_CHANNEL: &str = "line_allocated";

/// Destination for out-of-stock notifications.
pub const STOCK_ALERTS_DESTINATION: &str = "stock@made.com";

/// Registers a new batch, creating the product on first sight of a sku.
#[tracing::instrument(skip(uow), fields(reference = %cmd.reference, sku = %cmd.sku))]
pub async fn add_batch(cmd: CreateBatchData, uow: &dyn UnitOfWork) -> Result<()> {
    let product = match uow.products().get(&cmd.sku).await? {
        Some(product) => product,
        None => uow.products().add(Product::new(cmd.sku.clone())).await?,
    };
    product
        .lock()
        .await
        .add_batch(Batch::new(cmd.reference, cmd.sku, cmd.quantity, cmd.eta))?;
    uow.commit().await?;
    Ok(())
}

/// Allocates an order line against available stock.
///
/// Returns the chosen batch reference, or `None` when the product is
/// out of stock; the shortfall travels as an `OutOfStock` event rather
/// than a fault. An unknown sku is a caller error and propagates.
#[tracing::instrument(skip(uow), fields(order_id = %cmd.order_id, sku = %cmd.sku))]
pub async fn allocate(cmd: AllocateData, uow: &dyn UnitOfWork) -> Result<Option<BatchRef>> {
    let line = cmd.line();
    let product = uow
        .products()
        .get(line.sku())
        .await?
        .ok_or_else(|| ServiceError::InvalidSku(line.sku().clone()))?;
    let batchref = product.lock().await.allocate(line);
    uow.commit().await?;
    Ok(batchref)
}

/// Sets a batch's purchased quantity, deallocating lines as needed.
#[tracing::instrument(skip(uow), fields(reference = %cmd.reference, quantity = cmd.quantity))]
pub async fn change_batch_quantity(
    cmd: ChangeBatchQuantityData,
    uow: &dyn UnitOfWork,
) -> Result<()> {
    let product = uow
        .products()
        .get_by_batchref(&cmd.reference)
        .await?
        .ok_or_else(|| ServiceError::UnknownBatch(cmd.reference.clone()))?;
    product
        .lock()
        .await
        .change_batch_quantity(&cmd.reference, cmd.quantity)?;
    uow.commit().await?;
    Ok(())
}

/// Re-runs allocation for a line that lost its batch.
///
/// The fresh attempt goes through the normal domain path, so it may
/// land on a different batch (or the one that shrank) and may raise
/// further `Allocated` or `OutOfStock` events.
#[tracing::instrument(skip(uow), fields(order_id = %event.order_id, sku = %event.sku))]
pub async fn reallocate(event: DeallocatedData, uow: &dyn UnitOfWork) -> Result<()> {
    let line = event.line();
    let product = uow
        .products()
        .get(line.sku())
        .await?
        .ok_or_else(|| ServiceError::InvalidSku(line.sku().clone()))?;
    product.lock().await.allocate(line);
    uow.commit().await?;
    Ok(())
}

/// Notifies the stock desk that a sku ran dry.
pub async fn send_out_of_stock_notification(
    event: OutOfStockData,
    notifications: &dyn Notifications,
) -> Result<()> {
    notifications
        .send(
            STOCK_ALERTS_DESTINATION,
            &format!("Out of stock for {}", event.sku),
        )
        .await?;
    Ok(())
}

/// Publishes an allocated line to the external transport.
pub async fn publish_allocated_event(
    event: AllocatedData,
    publisher: &dyn EventPublisher,
) -> Result<()> {
    publisher
        .publish(LINE_ALLOCATED_CHANNEL, &Event::Allocated(event))
        .await?;
    Ok(())
}

/// Mirrors an allocation into the read model.
pub async fn add_allocation_to_read_model(
    event: AllocatedData,
    view: &dyn AllocationsView,
) -> Result<()> {
    view.add(AllocationRecord {
        order_id: event.order_id,
        sku: event.sku,
        batchref: event.batchref,
    })
    .await?;
    Ok(())
}

/// Removes a deallocated line from the read model.
pub async fn remove_allocation_from_read_model(
    event: DeallocatedData,
    view: &dyn AllocationsView,
) -> Result<()> {
    view.remove(&event.order_id, &event.sku).await?;
    Ok(())
}
