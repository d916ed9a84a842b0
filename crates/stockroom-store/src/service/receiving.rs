//! # Stock Receiving
//!
//! Records deliveries from suppliers and adds the quantities to stock.
//!
//! Same shape as order creation, with the sign flipped: every line is
//! checked first, all increments go out in one products write, and the
//! receipt is stored last. If the receipt write fails the increments are
//! taken back off.

use chrono::Utc;
use std::collections::hash_map::{Entry, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use stockroom_core::validation::validate_quantity;
use stockroom_core::{
    CoreError, CoreResult, Entity, EntityId, Product, StockReceipt, StockReceiptItem, Supplier,
};

use crate::error::{StoreError, StoreResult};
use crate::service::{compensate, lock_gate, net_deltas, stock_overflow};
use crate::store::EntityStore;

#[derive(Debug, Clone)]
pub struct StockReceiving {
    receipts: Arc<EntityStore<StockReceipt>>,
    suppliers: Arc<EntityStore<Supplier>>,
    products: Arc<EntityStore<Product>>,
    gate: Arc<Mutex<()>>,
}

impl StockReceiving {
    pub fn new(
        receipts: Arc<EntityStore<StockReceipt>>,
        suppliers: Arc<EntityStore<Supplier>>,
        products: Arc<EntityStore<Product>>,
    ) -> Self {
        Self::with_gate(receipts, suppliers, products, Arc::new(Mutex::new(())))
    }

    pub fn with_gate(
        receipts: Arc<EntityStore<StockReceipt>>,
        suppliers: Arc<EntityStore<Supplier>>,
        products: Arc<EntityStore<Product>>,
        gate: Arc<Mutex<()>>,
    ) -> Self {
        StockReceiving {
            receipts,
            suppliers,
            products,
            gate,
        }
    }

    /// Receives `(product_id, quantity)` lines from a supplier.
    ///
    /// ## Errors
    /// * `NotFound` - supplier, or a line's product, does not exist
    /// * `InvalidRequest` - `items` is empty, a quantity is ≤ 0, or the
    ///   received total would overflow a product's stock
    pub fn receive_stock(
        &self,
        supplier_id: EntityId,
        items: &[(EntityId, i64)],
    ) -> StoreResult<StockReceipt> {
        let _gate = lock_gate(&self.gate, "StockReceiving")?;

        if self.suppliers.get_by_id(supplier_id)?.is_none() {
            return Err(CoreError::not_found(Supplier::NAME, supplier_id).into());
        }
        if items.is_empty() {
            return Err(CoreError::invalid("a receipt needs at least one item").into());
        }

        let (lines, applied) = self.products.transact(|products| {
            let lines = restock(products, items)?;
            let applied = net_deltas(lines.iter().map(|l| (l.product_id, l.quantity)))?;
            Ok::<_, StoreError>((lines, applied))
        })?;

        let receipt = StockReceipt {
            id: 0,
            supplier_id,
            date: Utc::now(),
            items: lines,
        };

        match self.receipts.add(receipt) {
            Ok(receipt) => {
                info!(
                    receipt_id = receipt.id,
                    supplier_id,
                    lines = receipt.items.len(),
                    "Stock received"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(supplier_id, error = %e, "Receipt write failed, reverting stock");
                compensate(&self.products, &applied);
                Err(e)
            }
        }
    }

    pub fn get_all(&self) -> StoreResult<Vec<StockReceipt>> {
        self.receipts.get_all()
    }
}

/// Checks every line, including that the running stock figure still fits,
/// then applies all increments.
///
/// Leaves `products` untouched on error.
fn restock(
    products: &mut [Product],
    items: &[(EntityId, i64)],
) -> CoreResult<Vec<StockReceiptItem>> {
    let mut tracked: HashMap<EntityId, (usize, i64)> = HashMap::new();
    let mut lines = Vec::with_capacity(items.len());

    for &(product_id, quantity) in items {
        validate_quantity(quantity).map_err(|e| {
            CoreError::invalid(format!("product {product_id}: {e}, got {quantity}"))
        })?;

        let (index, stock) = match tracked.entry(product_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let index = products
                    .iter()
                    .position(|p| p.id == product_id)
                    .ok_or_else(|| CoreError::not_found(Product::NAME, product_id))?;
                entry.insert((index, products[index].stock_quantity))
            }
        };

        *stock = stock
            .checked_add(quantity)
            .ok_or_else(|| stock_overflow(product_id))?;
        lines.push(StockReceiptItem::snapshot(&products[*index], quantity));
    }

    for (index, stock) in tracked.into_values() {
        products[index].stock_quantity = stock;
    }

    Ok(lines)
}
