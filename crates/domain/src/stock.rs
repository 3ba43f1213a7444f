//! Stock reconciliation on order completion.

use std::collections::HashMap;

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::DomainError;
use crate::order::{OrderItem, StatusChange};
use crate::value_objects::Quantity;

/// Stock level at or below which an admin alert is raised.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Result of deducting one line item from a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    /// Quantity the line item asked for.
    pub requested: Quantity,
    /// Stock before the deduction.
    pub previous: Quantity,
    /// Stock after the deduction, never negative.
    pub remaining: Quantity,
    /// True when stock was insufficient and got clamped to zero.
    pub shortfall: bool,
}

impl StockAdjustment {
    /// Quantity actually taken out of stock.
    pub fn deducted(&self) -> Quantity {
        self.previous - self.remaining
    }
}

/// Tunables for stock handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPolicy {
    pub low_stock_threshold: Quantity,
}

impl StockPolicy {
    pub fn new(low_stock_threshold: Quantity) -> Self {
        Self {
            low_stock_threshold,
        }
    }

    /// Returns true if `product` should raise a low-stock alert.
    pub fn is_low_stock(&self, product: &Product) -> bool {
        product.is_low_stock(self.low_stock_threshold)
    }
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self::new(Quantity::units(DEFAULT_LOW_STOCK_THRESHOLD))
    }
}

/// Decides and applies inventory changes caused by order status changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockReconciler {
    policy: StockPolicy,
}

impl StockReconciler {
    pub fn new(policy: StockPolicy) -> Self {
        Self { policy }
    }

    /// Deducts the order's items from `products` on the first arrival in
    /// `Completed`; any other change is a no-op.
    ///
    /// `products` must hold every product referenced by `items`. Products
    /// are mutated in place; the caller persists the quantity and
    /// availability of each adjusted product.
    pub fn on_status_change(
        &self,
        change: &StatusChange,
        items: &[OrderItem],
        products: &mut HashMap<ProductId, Product>,
    ) -> Result<Vec<StockAdjustment>, DomainError> {
        if !change.completes_order() {
            return Ok(Vec::new());
        }

        // Check references first so a missing product leaves every product untouched.
        if let Some(missing) = items.iter().find(|i| !products.contains_key(&i.product_id)) {
            return Err(DomainError::not_found("Product", missing.product_id));
        }

        let mut adjustments = Vec::with_capacity(items.len());
        for item in items {
            if let Some(product) = products.get_mut(&item.product_id) {
                adjustments.push(product.deduct(item.quantity));
            }
        }
        Ok(adjustments)
    }

    /// Returns the products among `products` that are at or below the threshold.
    pub fn low_stock<'a>(
        &self,
        products: impl IntoIterator<Item = &'a Product>,
    ) -> Vec<&'a Product> {
        products
            .into_iter()
            .filter(|p| self.policy.is_low_stock(p))
            .collect()
    }
}
