//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Product     │   │    Supplier     │       │
//! │  │  id, name       │   │  id, name       │   │  id, name       │       │
//! │  │  phone, email   │   │  price (Money)  │   │  contact        │       │
//! │  └─────────────────┘   │  stockQuantity  │   └─────────────────┘       │
//! │                        │  isActive       │                              │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │  StockReceipt   │   │    Employee     │       │
//! │  │  customerId     │   │  supplierId     │   │  username       │       │
//! │  │  items[]        │   │  items[]        │   │  password(hash) │       │
//! │  │  isCancelled    │   │  date           │   │  role           │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every stored record implements [`Entity`]: an integer id, unique within
//! its own collection, assigned by the store on `add`. Ids are never chosen
//! by callers; whatever id an entity carries before `add` is overwritten.
//!
//! ## Snapshot Pattern
//! `OrderItem` and `StockReceiptItem` freeze the product name (and, for
//! orders, the unit price) at the moment they are created. Later product
//! edits never reach existing orders or receipts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

/// Integer identity of a stored record.
pub type EntityId = i64;

// =============================================================================
// Entity Trait
// =============================================================================

/// A record that lives in its own collection and carries a store-assigned id.
///
/// `NAME` is the type name the store derives the resource name from
/// (`"Product"` → `products.json`).
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Type name, singular, PascalCase.
    const NAME: &'static str;

    /// Returns the record's id (0 before it is first stored).
    fn id(&self) -> EntityId;

    /// Overwrites the record's id. Only the store calls this.
    fn set_id(&mut self, id: EntityId);
}

macro_rules! impl_entity {
    ($ty:ty, $name:literal) => {
        impl Entity for $ty {
            const NAME: &'static str = $name;

            #[inline]
            fn id(&self) -> EntityId {
                self.id
            }

            #[inline]
            fn set_id(&mut self, id: EntityId) {
                self.id = id;
            }
        }
    };
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Customer {
            id: 0,
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }
}

impl_entity!(Customer, "Customer");

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: EntityId,

    /// Display name, copied into order lines at order time.
    pub name: String,

    /// Unit price. Never negative.
    pub price: Money,

    /// Units on hand. Never negative between operations.
    pub stock_quantity: i64,

    /// Inactive products stay in the catalog for history.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Creates an active product.
    pub fn new(name: impl Into<String>, price: Money, stock_quantity: i64) -> Self {
        Product {
            id: 0,
            name: name.into(),
            price,
            stock_quantity,
            is_active: true,
        }
    }
}

impl_entity!(Product, "Product");

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub contact: String,
}

impl Supplier {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Supplier {
            id: 0,
            name: name.into(),
            contact: contact.into(),
        }
    }
}

impl_entity!(Supplier, "Supplier");

// =============================================================================
// Employee & Role
// =============================================================================

/// What an employee is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Manages employees; satisfies every role requirement.
    Admin,
    /// Creates and cancels orders.
    Sales,
    /// Maintains products, suppliers and stock receipts.
    Inventory,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Sales => write!(f, "Sales"),
            Role::Inventory => write!(f, "Inventory"),
        }
    }
}

/// A staff login.
///
/// `password` holds an argon2 PHC string produced by the store crate's
/// `auth::hash_password`, never the plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: EntityId,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl_entity!(Employee, "Employee");

// =============================================================================
// Stock Receipt
// =============================================================================

/// One delivery from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReceipt {
    #[serde(default)]
    pub id: EntityId,
    pub supplier_id: EntityId,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<StockReceiptItem>,
}

/// A received line. `product_name` is frozen at receiving time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReceiptItem {
    pub product_id: EntityId,
    pub product_name: String,
    pub quantity: i64,
}

impl StockReceiptItem {
    pub fn snapshot(product: &Product, quantity: i64) -> Self {
        StockReceiptItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
        }
    }
}

impl_entity!(StockReceipt, "StockReceipt");

// =============================================================================
// Order
// =============================================================================

/// A customer order.
///
/// Items are fixed at construction and the cancelled flag only moves
/// forward, so neither is a public field. `total_amount` is always computed
/// from the items and is not part of the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: EntityId,
    pub customer_id: EntityId,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    items: Vec<OrderItem>,
    #[serde(default)]
    is_cancelled: bool,
}

impl Order {
    /// Creates an unsaved, active order.
    pub fn new(customer_id: EntityId, order_date: DateTime<Utc>, items: Vec<OrderItem>) -> Self {
        Order {
            id: 0,
            customer_id,
            order_date,
            items,
            is_cancelled: false,
        }
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    /// Marks this copy cancelled. Returns false if it already was.
    ///
    /// Only flips the in-memory value. Persisting a cancellation, and the
    /// restock that goes with it, is `OrderProcessor::cancel_order`'s job;
    /// the store crate does not hand out write access to orders otherwise.
    pub fn cancel(&mut self) -> bool {
        if self.is_cancelled {
            return false;
        }
        self.is_cancelled = true;
        true
    }

    /// Sum of line subtotals. Saturates rather than overflowing.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Sum of line subtotals, or `None` if any subtotal or the total does
    /// not fit in a `Money`.
    pub fn checked_total(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(), |total, item| {
            total.checked_add(item.checked_subtotal()?)
        })
    }

    /// UTC calendar day the order was placed on.
    pub fn order_day(&self) -> NaiveDate {
        self.order_date.date_naive()
    }
}

impl_entity!(Order, "Order");

/// A line on an order, priced at the moment the order was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    product_id: EntityId,
    product_name: String,
    quantity: i64,
    unit_price: Money,
}

impl OrderItem {
    /// Freezes the product's current name and price.
    pub fn snapshot(product: &Product, quantity: i64) -> Self {
        OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
        }
    }

    #[inline]
    pub fn product_id(&self) -> EntityId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// quantity × unit price.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// quantity × unit price, or `None` on overflow.
    #[inline]
    pub fn checked_subtotal(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pen() -> Product {
        let mut p = Product::new("Pen", Money::from_cents(1500), 200);
        p.set_id(1);
        p
    }

    #[test]
    fn test_order_total_is_sum_of_subtotals() {
        let mut notebook = Product::new("Notebook", Money::from_cents(12000), 50);
        notebook.set_id(2);

        let order = Order::new(
            1,
            Utc::now(),
            vec![OrderItem::snapshot(&pen(), 5), OrderItem::snapshot(&notebook, 2)],
        );

        assert_eq!(order.items()[0].subtotal().cents(), 7500);
        assert_eq!(order.total_amount().cents(), 7500 + 24000);
    }

    #[test]
    fn test_snapshot_ignores_later_product_changes() {
        let mut product = pen();
        let item = OrderItem::snapshot(&product, 1);

        product.name = "Gel Pen".to_string();
        product.price = Money::from_cents(2500);

        assert_eq!(item.product_name(), "Pen");
        assert_eq!(item.unit_price().cents(), 1500);
    }

    #[test]
    fn test_checked_total_detects_overflow() {
        let order = Order::new(1, Utc::now(), vec![OrderItem::snapshot(&pen(), 3)]);
        assert_eq!(order.checked_total(), Some(Money::from_cents(4500)));

        let mut gold = Product::new("Gold Bar", Money::from_cents(i64::MAX / 2 + 1), 10);
        gold.set_id(2);
        let order = Order::new(
            1,
            Utc::now(),
            vec![OrderItem::snapshot(&gold, 1), OrderItem::snapshot(&gold, 1)],
        );
        assert_eq!(order.checked_total(), None);
        assert_eq!(order.total_amount().cents(), i64::MAX);

        let huge = Order::new(1, Utc::now(), vec![OrderItem::snapshot(&pen(), i64::MAX)]);
        assert_eq!(huge.checked_total(), None);
    }

    #[test]
    fn test_cancel_only_once() {
        let mut order = Order::new(1, Utc::now(), vec![]);
        assert!(!order.is_cancelled());
        assert!(order.cancel());
        assert!(order.is_cancelled());
        assert!(!order.cancel());
    }

    #[test]
    fn test_product_json_is_camel_case() {
        let json = serde_json::to_value(pen()).unwrap();
        assert_eq!(json["stockQuantity"], 200);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["price"], "15.00");
    }

    #[test]
    fn test_order_json_has_no_stored_total() {
        let date = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let order = Order::new(4, date, vec![OrderItem::snapshot(&pen(), 2)]);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["customerId"], 4);
        assert_eq!(json["isCancelled"], false);
        assert_eq!(json["items"][0]["unitPrice"], "15.00");
        assert!(json.get("totalAmount").is_none());

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_product_defaults_to_active() {
        let p: Product =
            serde_json::from_str(r#"{"id":3,"name":"Ink","price":"4.50","stockQuantity":7}"#)
                .unwrap();
        assert!(p.is_active);
        assert_eq!(p.price.cents(), 450);
    }

    #[test]
    fn test_entity_names() {
        assert_eq!(Product::NAME, "Product");
        assert_eq!(StockReceipt::NAME, "StockReceipt");
        assert_eq!(Role::Inventory.to_string(), "Inventory");
    }
}
