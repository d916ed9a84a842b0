//! # Database Handle
//!
//! One shared store per entity type, plus the services built on them.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Database                                        │
//! │                                                                         │
//! │  StoreConfig::load(..)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::open(config) ← creates data_dir, one store per type         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ Arc<EntityStore<Customer>>   customers  │                           │
//! │  │ Arc<EntityStore<Product>>    products   │◄──┐                       │
//! │  │ Arc<EntityStore<Order>>      orders     │◄──┤ OrderProcessor        │
//! │  │ Arc<EntityStore<StockReceipt>> receipts │◄──┤ StockReceiving        │
//! │  │ Arc<EntityStore<Supplier>>   suppliers  │   │                       │
//! │  │ Arc<EntityStore<Employee>>   employees  │   │ both share one        │
//! │  │ Arc<Mutex<()>>               stock gate │───┘ stock gate            │
//! │  └─────────────────────────────────────────┘                           │
//! │                                                                         │
//! │  Cloning a Database clones the Arcs: every clone, processor and        │
//! │  receiving service works through the same lock per type.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use stockroom_core::{Customer, Employee, Entity, Order, Product, StockReceipt, Supplier};

use crate::codec::InMemoryCodec;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::service::{OrderProcessor, StockReceiving};
use crate::store::EntityStore;

/// Main handle providing store and service access.
///
/// ## Usage
/// ```rust
/// use stockroom_core::{Customer, Money, Product};
/// use stockroom_store::Database;
///
/// let db = Database::in_memory();
/// let customer = db.customers().add(Customer::new("Rahim", "017", "")).unwrap();
/// let pen = db.products().add(Product::new("Pen", Money::from_cents(1500), 200)).unwrap();
///
/// let order = db
///     .order_processor()
///     .create_order(customer.id, &[(pen.id, 5)])
///     .unwrap();
/// assert_eq!(order.total_amount().to_string(), "75.00");
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// `None` for in-memory databases.
    config: Option<StoreConfig>,
    customers: Arc<EntityStore<Customer>>,
    products: Arc<EntityStore<Product>>,
    suppliers: Arc<EntityStore<Supplier>>,
    employees: Arc<EntityStore<Employee>>,
    receipts: Arc<EntityStore<StockReceipt>>,
    orders: Arc<EntityStore<Order>>,
    /// Serializes every operation that touches stock across types.
    stock_gate: Arc<Mutex<()>>,
}

impl Database {
    /// Opens the file-backed database described by `config`.
    ///
    /// Validates the configuration and creates the data directory. Snapshot
    /// files are not read until the first operation on each type.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| StoreError::io(&config.data_dir, e))?;

        info!(
            data_dir = %config.data_dir.display(),
            load_policy = %config.load_policy,
            "Opening database"
        );

        Ok(Database {
            customers: Arc::new(EntityStore::open(&config)),
            products: Arc::new(EntityStore::open(&config)),
            suppliers: Arc::new(EntityStore::open(&config)),
            employees: Arc::new(EntityStore::open(&config)),
            receipts: Arc::new(EntityStore::open(&config)),
            orders: Arc::new(EntityStore::open(&config)),
            stock_gate: Arc::new(Mutex::new(())),
            config: Some(config),
        })
    }

    /// Creates a database that lives only in memory (for tests and demos).
    pub fn in_memory() -> Self {
        Database {
            config: None,
            customers: memory_store(),
            products: memory_store(),
            suppliers: memory_store(),
            employees: memory_store(),
            receipts: memory_store(),
            orders: memory_store(),
            stock_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Directory holding the snapshot files, if file-backed.
    pub fn data_dir(&self) -> Option<&Path> {
        self.config.as_ref().map(|c| c.data_dir.as_path())
    }

    pub fn config(&self) -> Option<&StoreConfig> {
        self.config.as_ref()
    }

    pub fn customers(&self) -> Arc<EntityStore<Customer>> {
        Arc::clone(&self.customers)
    }

    pub fn products(&self) -> Arc<EntityStore<Product>> {
        Arc::clone(&self.products)
    }

    pub fn suppliers(&self) -> Arc<EntityStore<Supplier>> {
        Arc::clone(&self.suppliers)
    }

    pub fn employees(&self) -> Arc<EntityStore<Employee>> {
        Arc::clone(&self.employees)
    }

    pub fn receipts(&self) -> Arc<EntityStore<StockReceipt>> {
        Arc::clone(&self.receipts)
    }

    /// Orders are written only through [`OrderProcessor`], so a cancellation
    /// always comes with its restock. Read them with
    /// [`order_processor`](Self::order_processor).
    pub(crate) fn orders(&self) -> Arc<EntityStore<Order>> {
        Arc::clone(&self.orders)
    }

    /// Order processor sharing this database's stores and stock gate.
    pub fn order_processor(&self) -> OrderProcessor {
        OrderProcessor::with_gate(
            self.orders(),
            self.customers(),
            self.products(),
            Arc::clone(&self.stock_gate),
        )
    }

    /// Receiving service sharing this database's stores and stock gate.
    pub fn stock_receiving(&self) -> StockReceiving {
        StockReceiving::with_gate(
            self.receipts(),
            self.suppliers(),
            self.products(),
            Arc::clone(&self.stock_gate),
        )
    }

    /// Checks that every collection can be loaded.
    ///
    /// ## Returns
    /// * `true` - All snapshot files are readable (or absent)
    /// * `false` - At least one is unreadable or a store lock is poisoned
    pub fn health_check(&self) -> bool {
        let checks = [
            (Customer::NAME, self.customers.count().map(drop)),
            (Product::NAME, self.products.count().map(drop)),
            (Supplier::NAME, self.suppliers.count().map(drop)),
            (Employee::NAME, self.employees.count().map(drop)),
            (StockReceipt::NAME, self.receipts.count().map(drop)),
            (Order::NAME, self.orders.count().map(drop)),
        ];

        let mut healthy = true;
        for (entity, result) in checks {
            if let Err(e) = result {
                warn!(entity, error = %e, "Health check failed");
                healthy = false;
            }
        }
        healthy
    }
}

fn memory_store<T: Entity>() -> Arc<EntityStore<T>> {
    Arc::new(EntityStore::new(InMemoryCodec::<T>::new()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadPolicy;
    use stockroom_core::Money;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory();
        assert!(db.health_check());
        assert!(db.data_dir().is_none());
    }

    #[test]
    fn test_open_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("shop");

        let db = Database::open(StoreConfig::new(&data)).unwrap();
        assert!(data.is_dir());
        assert_eq!(db.data_dir(), Some(data.as_path()));
        assert!(db.health_check());
    }

    #[test]
    fn test_clones_share_stores() {
        let db = Database::in_memory();
        let other = db.clone();

        db.products()
            .add(Product::new("Pen", Money::from_cents(1500), 200))
            .unwrap();
        assert_eq!(other.products().count().unwrap(), 1);
    }

    #[test]
    fn test_reopen_reads_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path());

        {
            let db = Database::open(config.clone()).unwrap();
            db.suppliers()
                .add(Supplier::new("Paper Mills Ltd", "01700000000"))
                .unwrap();
        }

        let db = Database::open(config).unwrap();
        let suppliers = db.suppliers().get_all().unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].id, 1);
        assert!(dir.path().join("suppliers.json").exists());
    }

    #[test]
    fn test_health_check_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("orders.json"), "{ not json").unwrap();

        let strict = Database::open(StoreConfig::new(dir.path())).unwrap();
        assert!(!strict.health_check());

        let lenient =
            Database::open(StoreConfig::new(dir.path()).load_policy(LoadPolicy::Lenient)).unwrap();
        assert!(lenient.health_check());
    }

    #[test]
    fn test_open_rejects_file_as_data_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            Database::open(StoreConfig::new(file.path())),
            Err(StoreError::Config(_))
        ));
    }
}
