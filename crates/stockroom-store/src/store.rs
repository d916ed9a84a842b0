//! # Entity Store
//!
//! Generic CRUD over one entity type, backed by a [`Codec`].
//!
//! ## Every Call Is One Critical Section
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EntityStore<Product>                                                   │
//! │                                                                         │
//! │  add(p) ──► lock ──► load_all ──► next id ──► push ──► save_all ──► unlock
//! │                                                                         │
//! │  Thread A: add ─────[========]                                          │
//! │  Thread B: add ────────────────[========]   (waits, sees A's record)   │
//! │                                                                         │
//! │  No two calls on the same store interleave their load/mutate/save,     │
//! │  so two concurrent adds can never pick the same id.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Limits
//! - The lock is per store instance. Share one instance per type (see
//!   [`Database`](crate::Database)); a second instance over the same file
//!   would have its own lock.
//! - Nothing protects against another process writing the same file.
//! - Every mutation rewrites the whole file. Fine for a shop's catalog,
//!   not for millions of records.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use stockroom_core::{Entity, EntityId};

use crate::codec::{Codec, JsonFileCodec};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Next id for a collection: max existing id + 1, or 1 when empty.
pub fn next_id<T: Entity>(items: &[T]) -> EntityId {
    items.iter().map(Entity::id).max().map_or(1, |max| max + 1)
}

/// Assigns the next id to `entity`, appends it, and returns the stored copy.
///
/// For use inside [`EntityStore::transact`] when an insert depends on a
/// check over the same collection.
pub fn push_with_next_id<T: Entity>(items: &mut Vec<T>, mut entity: T) -> T {
    entity.set_id(next_id(items));
    items.push(entity.clone());
    entity
}

/// Thread-safe store for every record of type `T`.
pub struct EntityStore<T: Entity> {
    codec: Mutex<Box<dyn Codec<T>>>,
}

impl<T: Entity> EntityStore<T> {
    /// Store backed by the given codec.
    pub fn new(codec: impl Codec<T> + 'static) -> Self {
        EntityStore {
            codec: Mutex::new(Box::new(codec)),
        }
    }

    /// Store backed by `<data_dir>/<type>s.json`.
    pub fn open(config: &StoreConfig) -> Self {
        Self::new(JsonFileCodec::<T>::new(config))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Box<dyn Codec<T>>>> {
        self.codec
            .lock()
            .map_err(|_| StoreError::LockPoisoned(T::NAME))
    }

    /// Fresh snapshot of the whole collection. Never cached.
    pub fn get_all(&self) -> StoreResult<Vec<T>> {
        let codec = self.lock()?;
        codec.load_all()
    }

    /// Record with the given id, if any.
    pub fn get_by_id(&self, id: EntityId) -> StoreResult<Option<T>> {
        let codec = self.lock()?;
        Ok(codec.load_all()?.into_iter().find(|e| e.id() == id))
    }

    /// Stores `entity` under a new id and returns it with that id.
    ///
    /// Any id the caller set is overwritten.
    pub fn add(&self, entity: T) -> StoreResult<T> {
        let codec = self.lock()?;
        let mut items = codec.load_all()?;
        let stored = push_with_next_id(&mut items, entity);
        codec.save_all(&items)?;

        debug!(entity = T::NAME, id = stored.id(), "Added");
        Ok(stored)
    }

    /// Replaces the record with the same id.
    ///
    /// Returns false, without writing, when no such record exists.
    pub fn update(&self, entity: T) -> StoreResult<bool> {
        let codec = self.lock()?;
        let mut items = codec.load_all()?;

        let Some(slot) = items.iter_mut().find(|e| e.id() == entity.id()) else {
            debug!(entity = T::NAME, id = entity.id(), "Update skipped, id not found");
            return Ok(false);
        };

        let id = entity.id();
        *slot = entity;
        codec.save_all(&items)?;

        debug!(entity = T::NAME, id, "Updated");
        Ok(true)
    }

    /// Removes every record with `id`. Writes only if something was removed.
    pub fn delete(&self, id: EntityId) -> StoreResult<bool> {
        let codec = self.lock()?;
        let mut items = codec.load_all()?;

        let before = items.len();
        items.retain(|e| e.id() != id);
        if items.len() == before {
            return Ok(false);
        }

        codec.save_all(&items)?;
        debug!(entity = T::NAME, id, "Deleted");
        Ok(true)
    }

    /// Number of stored records.
    pub fn count(&self) -> StoreResult<usize> {
        let codec = self.lock()?;
        Ok(codec.load_all()?.len())
    }

    /// Runs `f` over the loaded collection while holding the store lock.
    ///
    /// The collection is saved only when `f` returns `Ok`; on `Err` nothing
    /// is written. Use this when several records of this type must change
    /// together, or when an insert depends on the current contents.
    ///
    /// ```rust
    /// use stockroom_core::{Money, Product};
    /// use stockroom_store::{EntityStore, InMemoryCodec, StoreError};
    ///
    /// let store: EntityStore<Product> = EntityStore::new(InMemoryCodec::new());
    /// store.add(Product::new("Pen", Money::from_cents(1500), 200)).unwrap();
    ///
    /// store
    ///     .transact(|products| {
    ///         for p in products.iter_mut() {
    ///             p.stock_quantity += 10;
    ///         }
    ///         Ok::<_, StoreError>(())
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(store.get_by_id(1).unwrap().unwrap().stock_quantity, 210);
    /// ```
    pub fn transact<R, E>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let codec = self.lock()?;
        let mut items = codec.load_all()?;
        let result = f(&mut items)?;
        codec.save_all(&items)?;
        Ok(result)
    }
}

impl<T: Entity> fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resource = self
            .codec
            .lock()
            .map(|c| c.resource())
            .unwrap_or_else(|_| "<poisoned>".to_string());
        f.debug_struct("EntityStore")
            .field("entity", &T::NAME)
            .field("resource", &resource)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
