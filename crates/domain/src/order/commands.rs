//! Order commands.

use common::{OrderId, OrderItemId, ProductId, UserId};

use super::OrderStatus;
use crate::value_objects::Quantity;

/// Command to place a new order for a user.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The user placing the order.
    pub user_id: UserId,
}

impl PlaceOrder {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Command to add a product to an order, or change the quantity of its line.
#[derive(Debug, Clone)]
pub struct AddOrUpdateItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl AddOrUpdateItem {
    pub fn new(order_id: OrderId, product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            order_id,
            product_id,
            quantity,
        }
    }
}

/// Command to delete a line item from an order.
#[derive(Debug, Clone)]
pub struct RemoveItem {
    pub order_id: OrderId,
    pub item_id: OrderItemId,
}

impl RemoveItem {
    pub fn new(order_id: OrderId, item_id: OrderItemId) -> Self {
        Self { order_id, item_id }
    }
}

/// Command to move an order to a new status.
#[derive(Debug, Clone)]
pub struct TransitionStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl TransitionStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }

    /// Shorthand for moving the order to `Completed`.
    pub fn complete(order_id: OrderId) -> Self {
        Self::new(order_id, OrderStatus::Completed)
    }
}
