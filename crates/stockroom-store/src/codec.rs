//! # Snapshot Codec
//!
//! Loads and saves the complete collection of one entity type.
//!
//! ## One File Per Type
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  data_dir/                                                              │
//! │  ├── customers.json       ← Customer::NAME = "Customer"                │
//! │  ├── products.json        ← Product::NAME  = "Product"                 │
//! │  ├── orders.json                                                        │
//! │  ├── suppliers.json                                                     │
//! │  ├── stockreceipts.json                                                 │
//! │  └── employees.json                                                     │
//! │                                                                         │
//! │  Each file is a JSON array of camelCase records, indented by default.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Save Protocol
//! ```text
//! serialize ──► write products.json.tmp ──► rename over products.json
//! ```
//! A crash mid-write leaves the old file intact; readers never see half a
//! snapshot. There is no versioning and no migration between layouts.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use stockroom_core::Entity;

use crate::config::{LoadPolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};

// =============================================================================
// Codec Trait
// =============================================================================

/// Durable load/save of a whole collection.
///
/// Implementations are not required to be thread-safe for concurrent
/// read-modify-write; [`EntityStore`](crate::store::EntityStore) serializes
/// every call behind its own lock.
pub trait Codec<T>: Send {
    /// Returns every stored record, in stored order.
    fn load_all(&self) -> StoreResult<Vec<T>>;

    /// Replaces the stored collection with `items`.
    fn save_all(&self, items: &[T]) -> StoreResult<()>;

    /// Human-readable identity of the resource, for logs.
    fn resource(&self) -> String;
}

/// File name for an entity type: `"StockReceipt"` → `stockreceipts.json`.
pub fn resource_name<T: Entity>() -> String {
    format!("{}s.json", T::NAME.to_lowercase())
}

// =============================================================================
// JSON File Codec
// =============================================================================

/// Stores a collection as a JSON array in `<data_dir>/<type>s.json`.
#[derive(Debug)]
pub struct JsonFileCodec<T> {
    path: PathBuf,
    policy: LoadPolicy,
    pretty: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> JsonFileCodec<T> {
    /// Codec for `T` under the configured data directory.
    pub fn new(config: &StoreConfig) -> Self {
        JsonFileCodec {
            path: config.data_dir.join(resource_name::<T>()),
            policy: config.load_policy,
            pretty: config.pretty,
            _marker: PhantomData,
        }
    }
}

impl<T> JsonFileCodec<T> {
    /// Codec reading and writing exactly `path`.
    pub fn at_path(path: impl Into<PathBuf>, policy: LoadPolicy) -> Self {
        JsonFileCodec {
            path: path.into(),
            policy,
            pretty: true,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Applies the load policy to a file that exists but is unusable.
    fn recover(&self, err: StoreError) -> StoreResult<Vec<T>> {
        match self.policy {
            LoadPolicy::Strict => Err(err),
            LoadPolicy::Lenient => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Unreadable snapshot treated as empty collection"
                );
                Ok(Vec::new())
            }
        }
    }
}

impl<T> Codec<T> for JsonFileCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load_all(&self) -> StoreResult<Vec<T>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Snapshot missing, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return self.recover(StoreError::io(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        // `null` is accepted as an empty collection.
        match serde_json::from_str::<Option<Vec<T>>>(&contents) {
            Ok(items) => Ok(items.unwrap_or_default()),
            Err(e) => self.recover(StoreError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn save_all(&self, items: &[T]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let json = if self.pretty {
            serde_json::to_string_pretty(items)?
        } else {
            serde_json::to_string(items)?
        };

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(path = %self.path.display(), count = items.len(), "Snapshot saved");
        Ok(())
    }

    fn resource(&self) -> String {
        self.path.display().to_string()
    }
}

// =============================================================================
// In-Memory Codec
// =============================================================================

/// Keeps the collection in memory. Used by tests and throwaway databases.
///
/// Counts saves so callers can assert that an operation did not write.
#[derive(Debug)]
pub struct InMemoryCodec<T> {
    items: Mutex<Vec<T>>,
    saves: AtomicUsize,
}

impl<T> InMemoryCodec<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Starts from an existing collection, stored as-is (ids included).
    pub fn with_items(items: Vec<T>) -> Self {
        InMemoryCodec {
            items: Mutex::new(items),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save_all` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<T> Default for InMemoryCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Codec<T> for InMemoryCodec<T> {
    fn load_all(&self) -> StoreResult<Vec<T>> {
        let items = self
            .items
            .lock()
            .map_err(|_| StoreError::LockPoisoned("in-memory codec"))?;
        Ok(items.clone())
    }

    fn save_all(&self, items: &[T]) -> StoreResult<()> {
        let mut stored = self
            .items
            .lock()
            .map_err(|_| StoreError::LockPoisoned("in-memory codec"))?;
        *stored = items.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resource(&self) -> String {
        "memory".to_string()
    }
}

/// A shared codec, so a caller can keep a handle on the one a store owns.
impl<T, C> Codec<T> for Arc<C>
where
    C: Codec<T> + Sync + ?Sized,
{
    fn load_all(&self) -> StoreResult<Vec<T>> {
        (**self).load_all()
    }

    fn save_all(&self, items: &[T]) -> StoreResult<()> {
        (**self).save_all(items)
    }

    fn resource(&self) -> String {
        (**self).resource()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
