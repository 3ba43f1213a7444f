//! Notifications derived from domain changes.
//!
//! These are plain data. They are queued on the unit of work that produced
//! them and handed to a notification sink only after that unit commits.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, Product, ProductType};
use crate::order::{Order, OrderStatus, StatusChange};
use crate::value_objects::{Money, Quantity};

/// A message that should go out once the triggering write is durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Tell the order's owner about a status change.
    OrderStatusChanged(OrderStatusNotice),
    /// Tell the admin channel that a product is running out.
    LowStock(LowStockNotice),
}

impl Notification {
    /// Short name used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OrderStatusChanged(_) => "order_status",
            Notification::LowStock(_) => "low_stock",
        }
    }
}

/// Order summary captured at the time of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusNotice {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub previous: OrderStatus,
    pub current: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
}

impl OrderStatusNotice {
    /// Builds the notice for `change`, or None when the status did not change.
    pub fn for_change(order: &Order, change: &StatusChange) -> Option<Self> {
        change.is_change().then(|| Self {
            order_id: order.id(),
            user_id: order.user_id(),
            previous: change.previous,
            current: change.current,
            created_at: order.created_at(),
            total_price: order.total_price(),
        })
    }
}

/// Product stock snapshot for the admin alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockNotice {
    pub product_id: ProductId,
    pub product_name: String,
    pub category_name: String,
    pub product_type_name: Option<String>,
    pub remaining: Quantity,
    pub unit_label: String,
}

impl LowStockNotice {
    pub fn new(product: &Product, category: &Category, product_type: Option<&ProductType>) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            category_name: category.name.clone(),
            product_type_name: product_type.map(|t| t.name.clone()),
            remaining: product.on_hand_quantity(),
            unit_label: product.unit_label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_status_yields_no_notice() {
        let mut order = Order::place(UserId::new(), Utc::now());
        let change = order.transition_to(OrderStatus::Preparing).unwrap();
        assert!(OrderStatusNotice::for_change(&order, &change).is_none());
    }

    #[test]
    fn notice_captures_order_summary() {
        let mut order = Order::place(UserId::new(), Utc::now());
        let change = order.transition_to(OrderStatus::Delivering).unwrap();
        let notice = OrderStatusNotice::for_change(&order, &change).unwrap();

        assert_eq!(notice.order_id, order.id());
        assert_eq!(notice.user_id, order.user_id());
        assert_eq!(notice.previous, OrderStatus::Preparing);
        assert_eq!(notice.current, OrderStatus::Delivering);
        assert_eq!(notice.created_at, order.created_at());
    }

    #[test]
    fn low_stock_notice_names_grouping() {
        let category = Category::new("Food").unwrap();
        let product_type = ProductType::new(&category, "Bread").unwrap();
        let mut product = Product::new("Non", category.id, Money::from_parts(300, 2))
            .unwrap()
            .with_unit_label("dona")
            .with_stock(Quantity::units(3))
            .unwrap();
        product.assign_type(Some(&product_type)).unwrap();

        let notice = LowStockNotice::new(&product, &category, Some(&product_type));
        assert_eq!(notice.category_name, "Food");
        assert_eq!(notice.product_type_name.as_deref(), Some("Bread"));
        assert_eq!(notice.remaining, Quantity::units(3));

        let wrapped = Notification::LowStock(notice);
        assert_eq!(wrapped.kind(), "low_stock");
    }
}
