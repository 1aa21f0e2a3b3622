//! Product repository port and its in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use common::{BatchRef, Sku, Version};
use domain::{Event, Product};

/// Shared handle to a product loaded into the current transaction.
///
/// Handlers mutate the product through this handle; the repository
/// writes the final state back to the store at commit time. A handle is
/// private to one unit of work and must never cross transactions.
pub type ProductRef = Arc<Mutex<Product>>;

/// Errors surfaced by the storage adapter.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The committed state changed under this transaction: the stored
    /// version no longer matches the version read at load time. The
    /// caller decides whether to retry; nothing was written.
    #[error("concurrency conflict on {sku}: read version {read}, store holds {stored}")]
    ConcurrencyConflict {
        sku: Sku,
        read: Version,
        stored: Version,
    },
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Port for loading and saving product aggregates.
///
/// Implementations track every product they hand out (`seen`) so the
/// unit of work can harvest domain events after each handler.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Stages a new product in the open transaction.
    async fn add(&self, product: Product) -> Result<ProductRef>;

    /// Loads the product for a sku, or `None` if the sku is unknown.
    ///
    /// Repeated loads within one transaction return the same handle.
    async fn get(&self, sku: &Sku) -> Result<Option<ProductRef>>;

    /// Loads the product owning the batch with the given reference.
    async fn get_by_batchref(&self, reference: &BatchRef) -> Result<Option<ProductRef>>;

    /// Loads every known product into the open transaction.
    async fn list(&self) -> Result<Vec<ProductRef>>;

    /// Every product handed out over this repository's lifetime, in
    /// first-visit order.
    async fn seen(&self) -> Vec<ProductRef>;
}

/// Committed product state shared between units of work.
///
/// Clones share the same underlying map, the way connections share a
/// database. Each transaction loads private copies from here and writes
/// them back on commit under a single write lock.
#[derive(Clone, Default)]
pub struct ProductStore {
    products: Arc<RwLock<HashMap<Sku, Product>>>,
}

impl ProductStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the committed state for a sku.
    pub async fn get(&self, sku: &Sku) -> Option<Product> {
        self.products.read().await.get(sku).cloned()
    }

    /// Returns the number of committed products.
    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns whether the store holds no products.
    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

struct SessionEntry {
    sku: Sku,
    handle: ProductRef,
    /// Version read from the store at load time; `None` for products
    /// added in this transaction.
    read_version: Option<Version>,
}

#[derive(Default)]
struct Session {
    /// Identity map for the open transaction, in first-load order.
    entries: Vec<SessionEntry>,
    index: HashMap<Sku, usize>,
    /// Every product handed out since this repository was created, kept
    /// across commits and rollbacks for event harvesting.
    seen: Vec<ProductRef>,
}

/// In-memory repository with commit-time optimistic concurrency.
///
/// Loads clone the committed product into a per-transaction identity
/// map. `commit_session` validates that no touched product moved under
/// the transaction before writing anything back, so a conflict leaves
/// the store untouched.
pub struct InMemoryRepository {
    store: ProductStore,
    session: RwLock<Session>,
}

impl InMemoryRepository {
    /// Creates a repository over the given committed store.
    pub fn new(store: ProductStore) -> Self {
        Self {
            store,
            session: RwLock::new(Session::default()),
        }
    }

    /// Returns the committed backing store.
    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    /// Writes every product in the open transaction back to the store.
    ///
    /// All entries are validated against the committed versions first;
    /// any mismatch aborts the whole commit with
    /// [`RepositoryError::ConcurrencyConflict`] and no writes.
    pub async fn commit_session(&self) -> Result<()> {
        let mut session = self.session.write().await;
        let mut products = self.store.products.write().await;

        for entry in &session.entries {
            let stored = products.get(&entry.sku).map(Product::version_number);
            let conflicting = match (entry.read_version, stored) {
                // Added this transaction, but someone else created the sku.
                (None, Some(_)) => true,
                (Some(read), Some(stored)) => read != stored,
                // The store never deletes; a vanished product is treated
                // as a conflict all the same.
                (Some(_), None) => true,
                (None, None) => false,
            };
            if conflicting {
                return Err(RepositoryError::ConcurrencyConflict {
                    sku: entry.sku.clone(),
                    read: entry.read_version.unwrap_or_default(),
                    stored: stored.unwrap_or_default(),
                });
            }
        }

        for entry in &session.entries {
            let mut product = entry.handle.lock().await.clone();
            // Pending events stay on the live handle for harvesting;
            // the committed copy starts with a clean buffer.
            product.take_events();
            products.insert(entry.sku.clone(), product);
        }

        session.entries.clear();
        session.index.clear();
        Ok(())
    }

    /// Discards the open transaction. Committed state is untouched and
    /// subsequent loads re-read it; the seen list survives so events
    /// already raised can still be harvested.
    pub async fn rollback_session(&self) {
        let mut session = self.session.write().await;
        session.entries.clear();
        session.index.clear();
    }

    /// Drains pending events from every product ever handed out, in
    /// first-visit order.
    pub async fn drain_new_events(&self) -> Vec<Event> {
        let session = self.session.read().await;
        let mut events = Vec::new();
        for handle in &session.seen {
            events.extend(handle.lock().await.take_events());
        }
        events
    }

    fn track(session: &mut Session, sku: Sku, handle: &ProductRef, read_version: Option<Version>) {
        session.index.insert(sku.clone(), session.entries.len());
        session.entries.push(SessionEntry {
            sku,
            handle: Arc::clone(handle),
            read_version,
        });
        session.seen.push(Arc::clone(handle));
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn add(&self, product: Product) -> Result<ProductRef> {
        let mut session = self.session.write().await;
        let sku = product.sku().clone();
        let handle: ProductRef = Arc::new(Mutex::new(product));
        Self::track(&mut session, sku, &handle, None);
        Ok(handle)
    }

    async fn get(&self, sku: &Sku) -> Result<Option<ProductRef>> {
        let mut session = self.session.write().await;
        if let Some(&index) = session.index.get(sku) {
            return Ok(Some(Arc::clone(&session.entries[index].handle)));
        }

        let loaded = self.store.products.read().await.get(sku).cloned();
        let Some(product) = loaded else {
            return Ok(None);
        };
        let read_version = product.version_number();
        let handle: ProductRef = Arc::new(Mutex::new(product));
        Self::track(&mut session, sku.clone(), &handle, Some(read_version));
        Ok(Some(handle))
    }

    async fn get_by_batchref(&self, reference: &BatchRef) -> Result<Option<ProductRef>> {
        {
            let session = self.session.read().await;
            for entry in &session.entries {
                if entry.handle.lock().await.batch(reference).is_some() {
                    return Ok(Some(Arc::clone(&entry.handle)));
                }
            }
        }

        let sku = self
            .store
            .products
            .read()
            .await
            .values()
            .find(|product| product.batch(reference).is_some())
            .map(|product| product.sku().clone());

        match sku {
            Some(sku) => self.get(&sku).await,
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<ProductRef>> {
        let mut skus: Vec<Sku> = self.store.products.read().await.keys().cloned().collect();
        skus.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut handles = Vec::with_capacity(skus.len());
        for sku in &skus {
            if let Some(handle) = self.get(sku).await? {
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    async fn seen(&self) -> Vec<ProductRef> {
        self.session.read().await.seen.clone()
    }
}
