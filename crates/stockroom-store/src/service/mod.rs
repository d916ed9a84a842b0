//! # Services
//!
//! Operations that change more than one collection.
//!
//! ## Stock Gate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Multi-Type Operations                                │
//! │                                                                         │
//! │  create_order / cancel_order / receive_stock                           │
//! │       │                                                                 │
//! │       │ 1. stock gate (Arc<Mutex<()>>, shared by both services)        │
//! │       ▼                                                                 │
//! │  products.transact(validate, then apply every stock change)            │
//! │       │                                                                 │
//! │       │ 2. product lock held only for this one write                   │
//! │       ▼                                                                 │
//! │  orders.add / orders.update / receipts.add                             │
//! │       │                                                                 │
//! │       │ 3. on failure: reverse the stock change, return the error      │
//! │       ▼                                                                 │
//! │  gate released                                                         │
//! │                                                                         │
//! │  Lock order is always gate → products → orders/receipts.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Plain readers go straight to the stores and are not gated; they may see
//! a stock change before the order or receipt that caused it.
//!
//! ## Available Services
//!
//! - [`OrderProcessor`] - Create, cancel and list customer orders
//! - [`StockReceiving`] - Record supplier deliveries

pub mod order;
pub mod receiving;

pub use order::OrderProcessor;
pub use receiving::StockReceiving;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::error;

use stockroom_core::{CoreError, CoreResult, EntityId, Product};

use crate::error::{StoreError, StoreResult};
use crate::store::EntityStore;

pub(crate) fn lock_gate<'a>(
    gate: &'a Mutex<()>,
    owner: &'static str,
) -> StoreResult<MutexGuard<'a, ()>> {
    gate.lock().map_err(|_| StoreError::LockPoisoned(owner))
}

/// Net stock change per product, in first-seen order.
///
/// Fails with `InvalidRequest` if a product's net change does not fit.
pub(crate) fn net_deltas(
    lines: impl IntoIterator<Item = (EntityId, i64)>,
) -> CoreResult<Vec<(EntityId, i64)>> {
    let mut order: Vec<EntityId> = Vec::new();
    let mut totals: HashMap<EntityId, i64> = HashMap::new();
    for (id, delta) in lines {
        let total = totals.entry(id).or_insert_with(|| {
            order.push(id);
            0
        });
        *total = total
            .checked_add(delta)
            .ok_or_else(|| stock_overflow(id))?;
    }
    Ok(order.into_iter().map(|id| (id, totals[&id])).collect())
}

/// Adds each delta to the matching product's stock in one write.
///
/// Products that no longer exist are skipped. Returns how many were changed.
/// If any result would overflow, nothing is written.
pub(crate) fn adjust_stock(
    products: &EntityStore<Product>,
    deltas: &[(EntityId, i64)],
) -> StoreResult<usize> {
    products.transact(|items| {
        let mut changed = 0;
        for &(id, delta) in deltas {
            if let Some(product) = items.iter_mut().find(|p| p.id == id) {
                product.stock_quantity = product
                    .stock_quantity
                    .checked_add(delta)
                    .ok_or_else(|| stock_overflow(id))?;
                changed += 1;
            }
        }
        Ok::<_, StoreError>(changed)
    })
}

pub(crate) fn stock_overflow(product_id: EntityId) -> CoreError {
    CoreError::invalid(format!("stock for product {product_id} would overflow"))
}

/// Reverses a stock change after the write that depended on it failed.
///
/// A failed reversal is logged; the caller still returns the original error.
pub(crate) fn compensate(products: &EntityStore<Product>, applied: &[(EntityId, i64)]) {
    let reverse: Vec<(EntityId, i64)> = applied.iter().map(|&(id, d)| (id, d.saturating_neg())).collect();
    if let Err(e) = adjust_stock(products, &reverse) {
        error!(error = %e, ?applied, "Stock compensation failed, stock is out of step");
    }
}
