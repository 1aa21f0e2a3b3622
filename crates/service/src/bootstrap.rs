//! Composition root: wires the default handler set into a message bus.
//!
//! The registry is built here, once, from injected collaborator
//! implementations, and moved into the bus. Alternative wirings (extra
//! event handlers, different ports) build their own [`HandlerRegistry`]
//! and call [`MessageBus::new`] directly.

use std::sync::Arc;

use adapters::{AllocationsView, EventPublisher, Notifications};
use common::BatchRef;
use domain::{Command, CommandKind, Event, EventKind};

use crate::config::BusConfig;
use crate::error::ServiceError;
use crate::handlers;
use crate::messagebus::{HandlerFuture, HandlerRegistry, MessageBus};
use crate::unit_of_work::UnitOfWork;

/// Builds a message bus with the default handler wiring.
pub fn bootstrap(
    uow: Arc<dyn UnitOfWork>,
    notifications: Arc<dyn Notifications>,
    publisher: Arc<dyn EventPublisher>,
    view: Arc<dyn AllocationsView>,
    config: BusConfig,
) -> MessageBus {
    let registry = default_registry(Arc::clone(&uow), notifications, publisher, view);
    MessageBus::new(uow, registry, config)
}

/// Builds the default handler registry:
///
/// - `CreateBatch` → [`handlers::add_batch`]
/// - `Allocate` → [`handlers::allocate`]
/// - `ChangeBatchQuantity` → [`handlers::change_batch_quantity`]
/// - `Allocated` → [`handlers::publish_allocated_event`],
///   [`handlers::add_allocation_to_read_model`]
/// - `Deallocated` → [`handlers::remove_allocation_from_read_model`],
///   [`handlers::reallocate`]
/// - `OutOfStock` → [`handlers::send_out_of_stock_notification`]
pub fn default_registry(
    uow: Arc<dyn UnitOfWork>,
    notifications: Arc<dyn Notifications>,
    publisher: Arc<dyn EventPublisher>,
    view: Arc<dyn AllocationsView>,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register_command(CommandKind::CreateBatch, {
        let uow = Arc::clone(&uow);
        Arc::new(move |command: Command| -> HandlerFuture<Option<BatchRef>> {
            let uow = Arc::clone(&uow);
            Box::pin(async move {
                match command {
                    Command::CreateBatch(cmd) => {
                        handlers::add_batch(cmd, uow.as_ref()).await?;
                        Ok(None)
                    }
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_command(CommandKind::Allocate, {
        let uow = Arc::clone(&uow);
        Arc::new(move |command: Command| -> HandlerFuture<Option<BatchRef>> {
            let uow = Arc::clone(&uow);
            Box::pin(async move {
                match command {
                    Command::Allocate(cmd) => handlers::allocate(cmd, uow.as_ref()).await,
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_command(CommandKind::ChangeBatchQuantity, {
        let uow = Arc::clone(&uow);
        Arc::new(move |command: Command| -> HandlerFuture<Option<BatchRef>> {
            let uow = Arc::clone(&uow);
            Box::pin(async move {
                match command {
                    Command::ChangeBatchQuantity(cmd) => {
                        handlers::change_batch_quantity(cmd, uow.as_ref()).await?;
                        Ok(None)
                    }
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_event(EventKind::Allocated, {
        let publisher = Arc::clone(&publisher);
        Arc::new(move |event: Event| -> HandlerFuture<()> {
            let publisher = Arc::clone(&publisher);
            Box::pin(async move {
                match event {
                    Event::Allocated(event) => {
                        handlers::publish_allocated_event(event, publisher.as_ref()).await
                    }
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_event(EventKind::Allocated, {
        let view = Arc::clone(&view);
        Arc::new(move |event: Event| -> HandlerFuture<()> {
            let view = Arc::clone(&view);
            Box::pin(async move {
                match event {
                    Event::Allocated(event) => {
                        handlers::add_allocation_to_read_model(event, view.as_ref()).await
                    }
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_event(EventKind::Deallocated, {
        let view = Arc::clone(&view);
        Arc::new(move |event: Event| -> HandlerFuture<()> {
            let view = Arc::clone(&view);
            Box::pin(async move {
                match event {
                    Event::Deallocated(event) => {
                        handlers::remove_allocation_from_read_model(event, view.as_ref()).await
                    }
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_event(EventKind::Deallocated, {
        let uow = Arc::clone(&uow);
        Arc::new(move |event: Event| -> HandlerFuture<()> {
            let uow = Arc::clone(&uow);
            Box::pin(async move {
                match event {
                    Event::Deallocated(event) => handlers::reallocate(event, uow.as_ref()).await,
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry.register_event(EventKind::OutOfStock, {
        let notifications = Arc::clone(&notifications);
        Arc::new(move |event: Event| -> HandlerFuture<()> {
            let notifications = Arc::clone(&notifications);
            Box::pin(async move {
                match event {
                    Event::OutOfStock(event) => {
                        handlers::send_out_of_stock_notification(event, notifications.as_ref())
                            .await
                    }
                    other => Err(ServiceError::UnexpectedMessage(other.kind().as_str())),
                }
            })
        })
    });

    registry
}
