//! Commands accepted by the allocation service.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use crate::order_line::OrderLine;

/// Commands requesting exactly one state change.
///
/// Each command has exactly one registered handler and produces a
/// result; faults raised by that handler propagate to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    /// Register a new stock batch for a sku.
    CreateBatch(CreateBatchData),

    /// Allocate an order line against available stock.
    Allocate(AllocateData),

    /// Set a batch's purchased quantity to a new absolute value.
    ChangeBatchQuantity(ChangeBatchQuantityData),
}

/// Discriminant of a [`Command`], used as the handler-registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateBatch,
    Allocate,
    ChangeBatchQuantity,
}

impl CommandKind {
    /// Returns the command type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateBatch => "CreateBatch",
            CommandKind::Allocate => "Allocate",
            CommandKind::ChangeBatchQuantity => "ChangeBatchQuantity",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    /// Returns the discriminant of this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateBatch(_) => CommandKind::CreateBatch,
            Command::Allocate(_) => CommandKind::Allocate,
            Command::ChangeBatchQuantity(_) => CommandKind::ChangeBatchQuantity,
        }
    }

    /// Builds a `CreateBatch` command.
    pub fn create_batch(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        quantity: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Command::CreateBatch(CreateBatchData {
            reference: reference.into(),
            sku: sku.into(),
            quantity,
            eta,
        })
    }

    /// Builds an `Allocate` command.
    pub fn allocate(order_id: impl Into<OrderId>, sku: impl Into<Sku>, quantity: u32) -> Self {
        Command::Allocate(AllocateData {
            order_id: order_id.into(),
            sku: sku.into(),
            quantity,
        })
    }

    /// Builds a `ChangeBatchQuantity` command.
    pub fn change_batch_quantity(reference: impl Into<BatchRef>, quantity: u32) -> Self {
        Command::ChangeBatchQuantity(ChangeBatchQuantityData {
            reference: reference.into(),
            quantity,
        })
    }
}

/// Data for the CreateBatch command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatchData {
    /// Identity reference of the new batch.
    pub reference: BatchRef,

    /// The sku the batch holds stock for.
    pub sku: Sku,

    /// Purchased quantity.
    pub quantity: u32,

    /// Expected arrival date; `None` for stock already in the warehouse.
    pub eta: Option<NaiveDate>,
}

/// Data for the Allocate command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocateData {
    /// The order the line belongs to.
    pub order_id: OrderId,

    /// The sku being ordered.
    pub sku: Sku,

    /// The quantity being ordered.
    pub quantity: u32,
}

impl AllocateData {
    /// Builds the order line this command requests.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.order_id.clone(), self.sku.clone(), self.quantity)
    }
}

/// Data for the ChangeBatchQuantity command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchQuantityData {
    /// The batch whose purchased quantity changes.
    pub reference: BatchRef,

    /// The new absolute purchased quantity (not a delta).
    pub quantity: u32,
}
