//! # Reports
//!
//! Aggregations over order and product snapshots.
//!
//! Every function here takes a slice the caller already loaded (usually
//! `store.get_all()?`) and does no I/O. Cancelled orders never count.
//!
//! ```text
//! orders ──► daily_sales_summary(date) ──► { orders: 3, total: 245.00 }
//! orders ──► best_selling_products(10) ──► [(Pen, 40), (Notebook, 7)]
//! products ► low_stock(10) ───────────────► [Notebook (stock 4)]
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::money::Money;
use crate::types::{EntityId, Order, Product};

/// Threshold used by the low-stock alert when none is given.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Daily Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub order_count: usize,
    pub total: Money,
}

/// Counts and totals the non-cancelled orders placed on `date` (UTC).
pub fn daily_sales_summary(orders: &[Order], date: NaiveDate) -> DailySummary {
    let (order_count, total) = orders
        .iter()
        .filter(|o| !o.is_cancelled() && o.order_day() == date)
        .fold((0, Money::zero()), |(count, total), o| {
            (count + 1, total + o.total_amount())
        });

    DailySummary {
        date,
        order_count,
        total,
    }
}

// =============================================================================
// Best Sellers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: EntityId,
    /// Name from the most recent order line seen for this product.
    pub product_name: String,
    pub quantity: i64,
}

/// Top `limit` products by quantity sold, highest first.
///
/// Ties are broken by product id so the output is stable.
pub fn best_selling_products(orders: &[Order], limit: usize) -> Vec<ProductSales> {
    let mut totals: HashMap<EntityId, ProductSales> = HashMap::new();

    for item in orders
        .iter()
        .filter(|o| !o.is_cancelled())
        .flat_map(|o| o.items())
    {
        let entry = totals
            .entry(item.product_id())
            .or_insert_with(|| ProductSales {
                product_id: item.product_id(),
                product_name: String::new(),
                quantity: 0,
            });
        entry.quantity = entry.quantity.saturating_add(item.quantity());
        entry.product_name = item.product_name().to_string();
    }

    let mut ranked: Vec<ProductSales> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Low Stock
// =============================================================================

/// Products whose stock is at or below `threshold`, in catalog order.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<&Product> {
    products
        .iter()
        .filter(|p| p.stock_quantity <= threshold)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entity, OrderItem};
    use chrono::{TimeZone, Utc};

    fn product(id: EntityId, name: &str, cents: i64, stock: i64) -> Product {
        let mut p = Product::new(name, Money::from_cents(cents), stock);
        p.set_id(id);
        p
    }

    fn order_on(day: u32, lines: &[(&Product, i64)]) -> Order {
        let date = Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap();
        let items = lines
            .iter()
            .map(|(p, q)| OrderItem::snapshot(p, *q))
            .collect();
        Order::new(1, date, items)
    }

    #[test]
    fn test_daily_summary_skips_other_days_and_cancelled() {
        let pen = product(1, "Pen", 1500, 200);
        let notebook = product(2, "Notebook", 12000, 50);

        let mut cancelled = order_on(3, &[(&notebook, 5)]);
        cancelled.cancel();

        let orders = vec![
            order_on(3, &[(&pen, 5)]),
            order_on(3, &[(&pen, 1), (&notebook, 1)]),
            order_on(4, &[(&notebook, 2)]),
            cancelled,
        ];

        let summary = daily_sales_summary(&orders, NaiveDate::from_ymd_opt(2026, 5, 3).unwrap());
        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.total.cents(), 7500 + 1500 + 12000);
    }

    #[test]
    fn test_best_sellers_ranked_and_limited() {
        let pen = product(1, "Pen", 1500, 200);
        let notebook = product(2, "Notebook", 12000, 50);
        let ink = product(3, "Ink", 450, 30);

        let mut cancelled = order_on(1, &[(&ink, 100)]);
        cancelled.cancel();

        let orders = vec![
            order_on(1, &[(&pen, 5), (&notebook, 3)]),
            order_on(2, &[(&pen, 2), (&ink, 3)]),
            cancelled,
        ];

        let ranked = best_selling_products(&orders, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].product_name, "Pen");
        assert_eq!(ranked[0].quantity, 7);
        // Notebook and Ink tie at 3; lower id first.
        assert_eq!(ranked[1].product_id, 2);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let products = vec![
            product(1, "Pen", 1500, 200),
            product(2, "Notebook", 12000, 10),
            product(3, "Ink", 450, 0),
        ];

        let low = low_stock(&products, DEFAULT_LOW_STOCK_THRESHOLD);
        let ids: Vec<EntityId> = low.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
