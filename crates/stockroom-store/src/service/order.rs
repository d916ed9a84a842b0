//! # Order Processor
//!
//! Creates and cancels customer orders, keeping product stock in step.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── customer exists? items non-empty?                              │
//! │     └── phase 1: check every line against tracked stock (no writes)    │
//! │     └── phase 2: one products write with every decrement               │
//! │     └── orders.add() → Order { id, isCancelled: false }                │
//! │                                                                         │
//! │  2. (OPTIONAL) CANCEL                                                  │
//! │     └── one products write restocking every line still in catalog      │
//! │     └── orders.update() → Order { isCancelled: true }                  │
//! │                                                                         │
//! │  A cancelled order never comes back. Cancelling twice returns false    │
//! │  and restocks nothing.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Repeated Products
//! Lines are checked in input order against a running stock figure, so
//! `[(pen, 150), (pen, 100)]` with 200 on hand fails on the second line even
//! though each line alone would fit.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use stockroom_core::validation::validate_quantity;
use stockroom_core::{
    CoreError, CoreResult, Customer, Entity, EntityId, Money, Order, OrderItem, Product,
};

use crate::error::{StoreError, StoreResult};
use crate::service::{adjust_stock, compensate, lock_gate, net_deltas};
use crate::store::EntityStore;

/// Order operations over the order, customer and product stores.
#[derive(Debug, Clone)]
pub struct OrderProcessor {
    orders: Arc<EntityStore<Order>>,
    customers: Arc<EntityStore<Customer>>,
    products: Arc<EntityStore<Product>>,
    gate: Arc<Mutex<()>>,
}

impl OrderProcessor {
    /// Creates a processor with its own stock gate.
    ///
    /// Prefer [`Database::order_processor`](crate::Database::order_processor),
    /// which shares the gate with stock receiving.
    pub fn new(
        orders: Arc<EntityStore<Order>>,
        customers: Arc<EntityStore<Customer>>,
        products: Arc<EntityStore<Product>>,
    ) -> Self {
        Self::with_gate(orders, customers, products, Arc::new(Mutex::new(())))
    }

    /// Creates a processor serialized behind an existing stock gate.
    pub fn with_gate(
        orders: Arc<EntityStore<Order>>,
        customers: Arc<EntityStore<Customer>>,
        products: Arc<EntityStore<Product>>,
        gate: Arc<Mutex<()>>,
    ) -> Self {
        OrderProcessor {
            orders,
            customers,
            products,
            gate,
        }
    }

    /// Places an order for `customer_id`.
    ///
    /// `items` is a list of `(product_id, quantity)` pairs. Each line
    /// freezes the product's current name and price.
    ///
    /// ## Errors
    /// * `NotFound` - customer, or a line's product, does not exist
    /// * `InvalidRequest` - `items` is empty, a quantity is ≤ 0, or the
    ///   order total does not fit in a `Money`
    /// * `InsufficientStock` - a line exceeds the stock left after earlier lines
    ///
    /// On any of these no product and no order is written.
    pub fn create_order(&self, customer_id: EntityId, items: &[(EntityId, i64)]) -> StoreResult<Order> {
        let _gate = lock_gate(&self.gate, "OrderProcessor")?;

        if self.customers.get_by_id(customer_id)?.is_none() {
            return Err(CoreError::not_found(Customer::NAME, customer_id).into());
        }
        if items.is_empty() {
            return Err(CoreError::invalid("an order needs at least one item").into());
        }

        let (lines, applied) = self.products.transact(|products| {
            let lines = reserve(products, items)?;
            let applied = net_deltas(lines.iter().map(|l| (l.product_id(), -l.quantity())))?;
            Ok::<_, StoreError>((lines, applied))
        })?;

        let order = Order::new(customer_id, Utc::now(), lines);

        match self.orders.add(order) {
            Ok(order) => {
                info!(
                    order_id = order.id,
                    customer_id,
                    lines = order.items().len(),
                    total = %order.total_amount(),
                    "Order created"
                );
                Ok(order)
            }
            Err(e) => {
                warn!(customer_id, error = %e, "Order write failed, restoring stock");
                compensate(&self.products, &applied);
                Err(e)
            }
        }
    }

    /// Cancels an order and puts its quantities back on the shelf.
    ///
    /// Returns false when the order does not exist or is already cancelled.
    /// Lines whose product has since been deleted are skipped.
    pub fn cancel_order(&self, order_id: EntityId) -> StoreResult<bool> {
        let _gate = lock_gate(&self.gate, "OrderProcessor")?;

        let Some(mut order) = self.orders.get_by_id(order_id)? else {
            debug!(order_id, "Cancel skipped, order not found");
            return Ok(false);
        };
        if !order.cancel() {
            debug!(order_id, "Cancel skipped, already cancelled");
            return Ok(false);
        }

        let restock = net_deltas(order.items().iter().map(|l| (l.product_id(), l.quantity())))?;
        let restocked = adjust_stock(&self.products, &restock)?;
        if restocked < restock.len() {
            debug!(
                order_id,
                skipped = restock.len() - restocked,
                "Products no longer in catalog were not restocked"
            );
        }

        match self.orders.update(order) {
            Ok(true) => {
                info!(order_id, restocked, "Order cancelled");
                Ok(true)
            }
            Ok(false) => {
                // Deleted outside the processor between read and write.
                compensate(&self.products, &restock);
                Ok(false)
            }
            Err(e) => {
                warn!(order_id, error = %e, "Order write failed, reverting restock");
                compensate(&self.products, &restock);
                Err(e)
            }
        }
    }

    /// One order by id.
    pub fn get_by_id(&self, order_id: EntityId) -> StoreResult<Option<Order>> {
        self.orders.get_by_id(order_id)
    }

    /// Every order, cancelled ones included.
    pub fn get_all(&self) -> StoreResult<Vec<Order>> {
        self.orders.get_all()
    }

    /// Orders placed by one customer, in stored order.
    pub fn get_by_customer(&self, customer_id: EntityId) -> StoreResult<Vec<Order>> {
        Ok(self
            .orders
            .get_all()?
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .collect())
    }
}

/// Checks every line against running stock and the running order total,
/// then applies all decrements.
///
/// Leaves `products` untouched on error.
fn reserve(products: &mut [Product], items: &[(EntityId, i64)]) -> CoreResult<Vec<OrderItem>> {
    let mut index: HashMap<EntityId, usize> = HashMap::new();
    for (i, p) in products.iter().enumerate() {
        index.entry(p.id).or_insert(i);
    }

    let mut tracked: HashMap<EntityId, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(items.len());
    let mut total = Money::zero();

    for &(product_id, quantity) in items {
        validate_quantity(quantity).map_err(|e| {
            CoreError::invalid(format!("product {product_id}: {e}, got {quantity}"))
        })?;

        let product = index
            .get(&product_id)
            .map(|&i| &products[i])
            .ok_or_else(|| CoreError::not_found(Product::NAME, product_id))?;

        let available = tracked.entry(product_id).or_insert(product.stock_quantity);
        if quantity > *available {
            return Err(CoreError::InsufficientStock {
                product_id,
                name: product.name.clone(),
                available: *available,
                requested: quantity,
            });
        }

        let line = OrderItem::snapshot(product, quantity);
        total = line
            .checked_subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| {
                CoreError::invalid(format!("order total too large at product {product_id}"))
            })?;

        *available -= quantity;
        lines.push(line);
    }

    for (product_id, remaining) in tracked {
        products[index[&product_id]].stock_quantity = remaining;
    }

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, InMemoryCodec};
    use crate::config::StoreConfig;
    use crate::Database;

    struct Shop {
        db: Database,
        processor: OrderProcessor,
        customer: EntityId,
        pen: EntityId,
        notebook: EntityId,
    }

    fn shop() -> Shop {
        let db = Database::in_memory();
        let customer = db
            .customers()
            .add(Customer::new("Rahim", "01711111111", "rahim@example.com"))
            .unwrap()
            .id;
        let notebook = db
            .products()
            .add(Product::new("Notebook", Money::from_cents(12000), 50))
            .unwrap()
            .id;
        let pen = db
            .products()
            .add(Product::new("Pen", Money::from_cents(1500), 200))
            .unwrap()
            .id;
        let processor = db.order_processor();
        Shop {
            db,
            processor,
            customer,
            pen,
            notebook,
        }
    }

    fn stock(db: &Database, id: EntityId) -> i64 {
        db.products().get_by_id(id).unwrap().unwrap().stock_quantity
    }

    fn domain(err: StoreError) -> CoreError {
        match err {
            StoreError::Domain(e) => e,
            other => panic!("expected a domain error, got {other:?}"),
        }
    }

    #[test]
    fn test_pen_order_end_to_end() {
        let s = shop();

        let order = s.processor.create_order(s.customer, &[(s.pen, 5)]).unwrap();
        assert_eq!(order.id, 1);
        assert_eq!(order.total_amount().to_string(), "75.00");
        assert_eq!(order.items()[0].product_name(), "Pen");
        assert_eq!(order.items()[0].unit_price(), Money::from_cents(1500));
        assert!(!order.is_cancelled());
        assert_eq!(stock(&s.db, s.pen), 195);

        assert!(s.processor.cancel_order(order.id).unwrap());
        assert_eq!(stock(&s.db, s.pen), 200);
        assert!(s.db.orders().get_by_id(order.id).unwrap().unwrap().is_cancelled());

        assert!(!s.processor.cancel_order(order.id).unwrap());
        assert_eq!(stock(&s.db, s.pen), 200);
    }

    #[test]
    fn test_insufficient_stock_writes_nothing() {
        let s = shop();

        let err = s
            .processor
            .create_order(s.customer, &[(s.pen, 10), (s.notebook, 51)])
            .unwrap_err();

        match domain(err) {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => {
                assert_eq!(product_id, s.notebook);
                assert_eq!(available, 50);
                assert_eq!(requested, 51);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The earlier, valid pen line was not applied either.
        assert_eq!(stock(&s.db, s.pen), 200);
        assert_eq!(stock(&s.db, s.notebook), 50);
        assert_eq!(s.db.orders().count().unwrap(), 0);
    }

    #[test]
    fn test_repeated_product_lines_accumulate() {
        let s = shop();

        let err = s
            .processor
            .create_order(s.customer, &[(s.pen, 150), (s.pen, 100)])
            .unwrap_err();
        assert!(matches!(
            domain(err),
            CoreError::InsufficientStock { available: 50, requested: 100, .. }
        ));
        assert_eq!(stock(&s.db, s.pen), 200);

        let order = s
            .processor
            .create_order(s.customer, &[(s.pen, 150), (s.pen, 50)])
            .unwrap();
        assert_eq!(order.items().len(), 2);
        assert_eq!(stock(&s.db, s.pen), 0);

        assert!(s.processor.cancel_order(order.id).unwrap());
        assert_eq!(stock(&s.db, s.pen), 200);
    }

    #[test]
    fn test_request_errors() {
        let s = shop();

        let err = s.processor.create_order(999, &[(s.pen, 1)]).unwrap_err();
        assert!(matches!(
            domain(err),
            CoreError::NotFound { entity: "Customer", id: 999 }
        ));

        let err = s.processor.create_order(s.customer, &[]).unwrap_err();
        assert!(matches!(domain(err), CoreError::InvalidRequest(_)));

        let err = s
            .processor
            .create_order(s.customer, &[(s.pen, 1), (s.notebook, 0)])
            .unwrap_err();
        assert!(matches!(domain(err), CoreError::InvalidRequest(_)));

        let err = s
            .processor
            .create_order(s.customer, &[(s.pen, -3)])
            .unwrap_err();
        assert!(matches!(domain(err), CoreError::InvalidRequest(_)));

        let err = s.processor.create_order(s.customer, &[(77, 1)]).unwrap_err();
        assert!(matches!(
            domain(err),
            CoreError::NotFound { entity: "Product", id: 77 }
        ));

        assert_eq!(stock(&s.db, s.pen), 200);
        assert_eq!(s.db.orders().count().unwrap(), 0);
    }

    #[test]
    fn test_quantity_checked_before_product_lookup() {
        let s = shop();
        let err = s.processor.create_order(s.customer, &[(77, 0)]).unwrap_err();
        assert!(matches!(domain(err), CoreError::InvalidRequest(_)));
    }

    #[test]
    fn test_order_keeps_price_after_product_changes() {
        let s = shop();
        let order = s.processor.create_order(s.customer, &[(s.pen, 2)]).unwrap();

        let mut pen = s.db.products().get_by_id(s.pen).unwrap().unwrap();
        pen.price = Money::from_cents(9900);
        pen.name = "Fountain Pen".to_string();
        assert!(s.db.products().update(pen).unwrap());

        let stored = s.db.orders().get_by_id(order.id).unwrap().unwrap();
        assert_eq!(stored.items()[0].product_name(), "Pen");
        assert_eq!(stored.total_amount().to_string(), "30.00");
    }

    #[test]
    fn test_cancel_skips_deleted_products() {
        let s = shop();
        let order = s
            .processor
            .create_order(s.customer, &[(s.pen, 5), (s.notebook, 2)])
            .unwrap();
        assert_eq!(stock(&s.db, s.notebook), 48);

        assert!(s.db.products().delete(s.pen).unwrap());
        assert!(s.processor.cancel_order(order.id).unwrap());

        assert_eq!(stock(&s.db, s.notebook), 50);
        assert!(s.db.products().get_by_id(s.pen).unwrap().is_none());
    }

    #[test]
    fn test_order_total_overflow_is_rejected() {
        let s = shop();
        let bulk = s
            .db
            .products()
            .add(Product::new("Bulk Pen", Money::from_cents(1500), 10_000_000_000_000_000))
            .unwrap()
            .id;

        let err = s
            .processor
            .create_order(s.customer, &[(s.pen, 1), (bulk, 10_000_000_000_000_000)])
            .unwrap_err();
        assert!(matches!(domain(err), CoreError::InvalidRequest(_)));

        assert_eq!(stock(&s.db, bulk), 10_000_000_000_000_000);
        assert_eq!(stock(&s.db, s.pen), 200);
        assert_eq!(s.db.orders().count().unwrap(), 0);

        let order = s.processor.create_order(s.customer, &[(bulk, 1_000)]).unwrap();
        assert_eq!(order.total_amount().to_string(), "15000.00");
        assert_eq!(order.checked_total(), Some(order.total_amount()));
    }

    #[test]
    fn test_huge_quantity_is_insufficient_stock() {
        let s = shop();

        let err = s
            .processor
            .create_order(s.customer, &[(s.pen, i64::MAX)])
            .unwrap_err();
        assert!(matches!(
            domain(err),
            CoreError::InsufficientStock { available: 200, requested: i64::MAX, .. }
        ));

        assert_eq!(stock(&s.db, s.pen), 200);
        assert!(s.processor.create_order(s.customer, &[(s.pen, 1)]).is_ok());
    }

    #[test]
    fn test_cancel_restock_overflow_leaves_order_active() {
        let s = shop();
        let order = s.processor.create_order(s.customer, &[(s.pen, 5)]).unwrap();

        let mut pen = s.db.products().get_by_id(s.pen).unwrap().unwrap();
        pen.stock_quantity = i64::MAX - 1;
        assert!(s.db.products().update(pen).unwrap());

        let err = s.processor.cancel_order(order.id).unwrap_err();
        assert!(matches!(domain(err), CoreError::InvalidRequest(_)));

        assert_eq!(stock(&s.db, s.pen), i64::MAX - 1);
        assert!(!s.processor.get_by_id(order.id).unwrap().unwrap().is_cancelled());
        assert!(s.db.products().count().is_ok());
    }

    #[test]
    fn test_get_by_id_reads_through_processor() {
        let s = shop();
        let order = s.processor.create_order(s.customer, &[(s.pen, 2)]).unwrap();

        assert_eq!(s.processor.get_by_id(order.id).unwrap(), Some(order.clone()));
        assert!(s.processor.get_by_id(order.id + 1).unwrap().is_none());

        assert!(s.processor.cancel_order(order.id).unwrap());
        assert!(s.processor.get_by_id(order.id).unwrap().unwrap().is_cancelled());
    }

    #[test]
    fn test_cancel_missing_order() {
        let s = shop();
        assert!(!s.processor.cancel_order(42).unwrap());
    }

    #[test]
    fn test_get_by_customer() {
        let s = shop();
        let karim = s
            .db
            .customers()
            .add(Customer::new("Karim", "01822222222", ""))
            .unwrap()
            .id;

        s.processor.create_order(s.customer, &[(s.pen, 1)]).unwrap();
        s.processor.create_order(karim, &[(s.notebook, 1)]).unwrap();
        s.processor.create_order(s.customer, &[(s.notebook, 3)]).unwrap();

        let rahims = s.processor.get_by_customer(s.customer).unwrap();
        assert_eq!(rahims.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(s.processor.get_by_customer(karim).unwrap().len(), 1);
        assert!(s.processor.get_by_customer(999).unwrap().is_empty());
        assert_eq!(s.processor.get_all().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_order_write_restores_stock() {
        let s = shop();
        let orders: Arc<EntityStore<Order>> = Arc::new(EntityStore::new(BrokenCodec));
        let processor = OrderProcessor::new(orders, s.db.customers(), s.db.products());

        let err = processor
            .create_order(s.customer, &[(s.pen, 5), (s.pen, 5)])
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(stock(&s.db, s.pen), 200);
    }

    #[test]
    fn test_concurrent_orders_never_oversell() {
        let s = shop();
        let processor = Arc::new(s.processor);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let processor = Arc::clone(&processor);
                let (customer, notebook) = (s.customer, s.notebook);
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| processor.create_order(customer, &[(notebook, 1)]).is_ok())
                        .count()
                })
            })
            .collect();

        let placed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(placed, 50);
        assert_eq!(stock(&s.db, s.notebook), 0);
        assert_eq!(s.db.orders().count().unwrap(), 50);
    }

    #[test]
    fn test_orders_persist_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(StoreConfig::new(dir.path())).unwrap();
        let customer = db.customers().add(Customer::new("Rahim", "", "")).unwrap();
        let pen = db
            .products()
            .add(Product::new("Pen", Money::from_cents(1500), 200))
            .unwrap();

        db.order_processor()
            .create_order(customer.id, &[(pen.id, 5)])
            .unwrap();

        let text = std::fs::read_to_string(dir.path().join("orders.json")).unwrap();
        assert!(text.contains("\"customerId\": 1"));
        assert!(text.contains("\"unitPrice\": \"15.00\""));
        assert!(!text.contains("totalAmount"));
        assert!(
            std::fs::read_to_string(dir.path().join("products.json"))
                .unwrap()
                .contains("\"stockQuantity\": 195")
        );
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let mut pen = Product::new("Pen", Money::from_cents(1500), 3);
        pen.set_id(1);
        let mut products = vec![pen];

        assert!(reserve(&mut products, &[(1, 2), (1, 2)]).is_err());
        assert_eq!(products[0].stock_quantity, 3);

        let lines = reserve(&mut products, &[(1, 2), (1, 1)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(products[0].stock_quantity, 0);
    }

    /// Loads as empty, fails every save.
    struct BrokenCodec;

    impl Codec<Order> for BrokenCodec {
        fn load_all(&self) -> StoreResult<Vec<Order>> {
            InMemoryCodec::new().load_all()
        }

        fn save_all(&self, _items: &[Order]) -> StoreResult<()> {
            Err(StoreError::io(
                "orders.json",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }

        fn resource(&self) -> String {
            "broken".to_string()
        }
    }
}
