//! Order line items.

use common::{OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::DomainError;
use crate::value_objects::{Money, Quantity};

/// One product-quantity entry of an order.
///
/// `total_price` is a price snapshot: it is computed from the product's
/// unit price when the item is written and does not follow later price
/// changes of the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The item identifier.
    pub id: OrderItemId,

    /// The order owning this item.
    pub order_id: OrderId,

    /// The ordered product.
    pub product_id: ProductId,

    /// Quantity ordered, always greater than zero.
    pub quantity: Quantity,

    /// Quantity times the unit price at write time.
    pub total_price: Money,
}

impl OrderItem {
    /// Creates an item priced from the product's current unit price.
    pub(crate) fn priced(
        order_id: OrderId,
        product: &Product,
        quantity: Quantity,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: OrderItemId::new(),
            order_id,
            product_id: product.id,
            quantity,
            total_price: product.unit_price().times(quantity)?,
        })
    }

    /// Returns a copy with the new quantity and a fresh price snapshot.
    pub(crate) fn repriced(&self, product: &Product, quantity: Quantity) -> Result<Self, DomainError> {
        Ok(Self {
            quantity,
            total_price: product.unit_price().times(quantity)?,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CategoryId;

    #[test]
    fn priced_item_snapshots_unit_price() {
        let mut product =
            Product::new("Somsa", CategoryId::new(), Money::from_parts(800, 2)).unwrap();
        let item = OrderItem::priced(OrderId::new(), &product, Quantity::units(3)).unwrap();
        assert_eq!(item.total_price, Money::from_parts(2400, 2));

        product.set_unit_price(Money::from_parts(1000, 2)).unwrap();
        assert_eq!(item.total_price, Money::from_parts(2400, 2));
    }

    #[test]
    fn reprice_uses_current_price() {
        let mut product =
            Product::new("Somsa", CategoryId::new(), Money::from_parts(800, 2)).unwrap();
        let item = OrderItem::priced(OrderId::new(), &product, Quantity::units(1)).unwrap();

        product.set_unit_price(Money::from_parts(900, 2)).unwrap();
        let updated = item.repriced(&product, Quantity::units(2)).unwrap();

        assert_eq!(updated.id, item.id);
        assert_eq!(updated.quantity, Quantity::units(2));
        assert_eq!(updated.total_price, Money::from_parts(1800, 2));
    }
}
