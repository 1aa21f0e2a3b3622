//! Domain error types.

use common::{BatchRef, Sku};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A batch reference did not resolve within its owning product.
    #[error("batch {reference} not found in product")]
    BatchNotFound { reference: BatchRef },

    /// A batch was added to a product with a different sku.
    #[error("cannot add batch {reference} with sku {batch_sku} to product {product_sku}")]
    SkuMismatch {
        reference: BatchRef,
        batch_sku: Sku,
        product_sku: Sku,
    },
}
