//! Unit of work: transaction scope over one repository.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use adapters::{InMemoryRepository, ProductStore, Repository, RepositoryError};
use domain::Event;

/// A transactional scope bounding one set of aggregate mutations and
/// the events they raise.
///
/// A transaction opens implicitly with the first repository access
/// inside a handler and closes when the bus calls [`rollback`] after
/// the handler returns. Rollback after a commit is a no-op, so the
/// always-rollback discipline guarantees that no partial write survives
/// a handler fault.
///
/// [`rollback`]: UnitOfWork::rollback
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// The repository scoped to this unit of work.
    fn products(&self) -> &dyn Repository;

    /// Persists every product touched in the open transaction.
    ///
    /// Fails with [`RepositoryError::ConcurrencyConflict`] when any
    /// touched product's stored version no longer matches the version
    /// this transaction read; the conflict is propagated untranslated
    /// and nothing is written.
    async fn commit(&self) -> Result<(), RepositoryError>;

    /// Discards uncommitted state. A no-op when the open transaction
    /// already committed.
    async fn rollback(&self);

    /// Drains the events raised by every product this unit of work has
    /// handed out, in visitation order, clearing the per-product
    /// buffers. This is how domain decisions become bus messages
    /// without the domain model depending on the bus.
    async fn collect_new_events(&self) -> Vec<Event>;
}

/// Unit of work over the in-memory repository.
pub struct InMemoryUnitOfWork {
    products: InMemoryRepository,
    committed: AtomicBool,
}

impl InMemoryUnitOfWork {
    /// Creates a unit of work over a fresh, empty store.
    pub fn new() -> Self {
        Self::with_store(ProductStore::new())
    }

    /// Creates a unit of work over a shared committed store. Concurrent
    /// units of work built over clones of the same store coordinate
    /// through the commit-time version check only.
    pub fn with_store(store: ProductStore) -> Self {
        Self {
            products: InMemoryRepository::new(store),
            committed: AtomicBool::new(false),
        }
    }

    /// Returns the committed backing store, for inspection.
    pub fn store(&self) -> &ProductStore {
        self.products.store()
    }

    /// Returns whether any transaction has committed through this unit
    /// of work.
    pub fn committed(&self) -> bool {
        self.committed.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn products(&self) -> &dyn Repository {
        &self.products
    }

    async fn commit(&self) -> Result<(), RepositoryError> {
        self.products.commit_session().await?;
        self.committed.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn rollback(&self) {
        self.products.rollback_session().await;
    }

    async fn collect_new_events(&self) -> Vec<Event> {
        self.products.drain_new_events().await
    }
}
