//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, UserId};
use serde::Serialize;

use super::{OrderItem, OrderStatus, StatusChange};
use crate::catalog::Product;
use crate::error::DomainError;
use crate::value_objects::{Money, Quantity};

/// Order aggregate root.
///
/// Owns its line items and the derived `total_price`, which is the sum of
/// the items' price snapshots and is never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    is_confirmed: bool,
    total_price: Money,
    items: Vec<OrderItem>,
}

impl Order {
    /// Places a new, empty order for a user.
    pub fn place(user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            created_at,
            status: OrderStatus::default(),
            is_confirmed: false,
            total_price: Money::zero(),
            items: Vec::new(),
        }
    }

    /// Rebuilds an order from stored state.
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        status: OrderStatus,
        is_confirmed: bool,
        total_price: Money,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            id,
            user_id,
            created_at,
            status,
            is_confirmed,
            total_price,
            items,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_confirmed(&self) -> bool {
        self.is_confirmed
    }

    /// Returns the last computed total.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns all line items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the line item for a product, if any.
    pub fn item_for_product(&self, product_id: &common::ProductId) -> Option<&OrderItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Returns a line item by id.
    pub fn get_item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

}

// Commands
impl Order {
    /// Adds a line for `product`, or rewrites the existing line for it.
    ///
    /// The line total is priced from the product's unit price right now,
    /// then the order total is recomputed. Returns the written line. On
    /// error the order is left untouched.
    pub fn add_or_update_item(
        &mut self,
        product: &Product,
        quantity: Quantity,
    ) -> Result<OrderItem, DomainError> {
        let quantity = quantity.ordered()?;
        self.ensure_items_open()?;

        let position = self.items.iter().position(|i| i.product_id == product.id);
        let item = match position {
            Some(index) => self.items[index].repriced(product, quantity)?,
            None => OrderItem::priced(self.id, product, quantity)?,
        };
        let total = Money::total(
            self.items
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != position)
                .map(|(_, line)| line.total_price)
                .chain(std::iter::once(item.total_price)),
        )?;

        match position {
            Some(index) => self.items[index] = item.clone(),
            None => self.items.push(item.clone()),
        }
        self.total_price = total;
        Ok(item)
    }

    /// Removes a line item and recomputes the total.
    pub fn remove_item(&mut self, item_id: OrderItemId) -> Result<OrderItem, DomainError> {
        self.ensure_items_open()?;

        let position = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| DomainError::not_found("Order item", item_id))?;
        let total = Money::total(
            self.items
                .iter()
                .filter(|item| item.id != item_id)
                .map(|item| item.total_price),
        )?;
        let removed = self.items.remove(position);
        self.total_price = total;
        Ok(removed)
    }

    /// Sets the total to the sum of the current line totals and returns it.
    ///
    /// Idempotent: with no item change in between, repeated calls yield the
    /// same value. Fails without touching the total if the sum does not fit.
    pub fn recompute_total(&mut self) -> Result<Money, DomainError> {
        self.total_price = Money::total(self.items.iter().map(|item| item.total_price))?;
        Ok(self.total_price)
    }

    /// Moves the order to `next` and reports what changed.
    ///
    /// The order's current status must be the persisted one, read in the
    /// transaction that will store the result. Re-applying the current
    /// status is accepted and yields a change with `previous == current`.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<StatusChange, DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }

        let change = StatusChange {
            order_id: self.id,
            previous: self.status,
            current: next,
        };
        self.status = next;
        Ok(change)
    }

    /// Marks the order as confirmed by the customer. Returns false if it already was.
    pub fn confirm(&mut self) -> bool {
        let changed = !self.is_confirmed;
        self.is_confirmed = true;
        changed
    }

    fn ensure_items_open(&self) -> Result<(), DomainError> {
        if self.status.can_modify_items() {
            Ok(())
        } else {
            Err(DomainError::OrderClosed {
                status: self.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CategoryId;

    fn product(price_cents: i64) -> Product {
        Product::new("Item", CategoryId::new(), Money::from_parts(price_cents, 2))
            .unwrap()
            .with_stock(Quantity::units(100))
            .unwrap()
    }

    fn create_order() -> Order {
        Order::place(UserId::new(), Utc::now())
    }

    #[test]
    fn test_place_order() {
        let user_id = UserId::new();
        let order = Order::place(user_id, Utc::now());
        assert_eq!(order.user_id(), user_id);
        assert_eq!(order.status(), OrderStatus::Preparing);
        assert!(!order.is_confirmed());
        assert!(order.items().is_empty());
        assert!(order.total_price().is_zero());
    }

    #[test]
    fn test_add_items_updates_total() {
        let mut order = create_order();
        let p = product(1000);
        let q = product(550);

        order.add_or_update_item(&p, Quantity::units(3)).unwrap();
        assert_eq!(order.total_price(), Money::from_parts(3000, 2));

        order.add_or_update_item(&q, Quantity::units(2)).unwrap();
        assert_eq!(order.total_price(), Money::from_parts(4100, 2));
        assert_eq!(order.items().len(), 2);
    }

    #[test]
    fn test_same_product_rewrites_line() {
        let mut order = create_order();
        let p = product(1000);

        let first = order.add_or_update_item(&p, Quantity::units(3)).unwrap();
        let second = order.add_or_update_item(&p, Quantity::units(1)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.total_price(), Money::from_parts(1000, 2));
    }

    #[test]
    fn test_non_positive_quantity_fails_without_change() {
        let mut order = create_order();
        let p = product(1000);
        order.add_or_update_item(&p, Quantity::units(1)).unwrap();

        let result = order.add_or_update_item(&p, Quantity::zero());
        assert!(matches!(result, Err(DomainError::InvalidQuantity { .. })));

        let result = order.add_or_update_item(&p, Quantity::units(-1));
        assert!(matches!(result, Err(DomainError::InvalidQuantity { .. })));

        assert_eq!(order.item_for_product(&p.id).unwrap().quantity, Quantity::units(1));
        assert_eq!(order.total_price(), Money::from_parts(1000, 2));
    }

    #[test]
    fn test_oversized_quantity_fails_without_change() {
        let mut order = create_order();
        let p = product(1000);
        order.add_or_update_item(&p, Quantity::units(1)).unwrap();

        let huge: Quantity = "79228162514264337593543950335".parse().unwrap();
        let result = order.add_or_update_item(&p, huge);
        assert!(matches!(result, Err(DomainError::OutOfRange { .. })));

        let result = order.add_or_update_item(&p, Quantity::from_parts(1005, 3));
        assert!(matches!(result, Err(DomainError::ExcessPrecision { .. })));

        assert_eq!(order.item_for_product(&p.id).unwrap().quantity, Quantity::units(1));
        assert_eq!(order.total_price(), Money::from_parts(1000, 2));
    }

    #[test]
    fn test_order_total_overflow_fails_without_change() {
        let mut order = create_order();
        let p = product(9_999_999_999);
        let q = product(9_999_999_999);
        order.add_or_update_item(&p, Quantity::units(60)).unwrap();
        let before = order.total_price();

        let result = order.add_or_update_item(&q, Quantity::units(60));
        assert!(matches!(
            result,
            Err(DomainError::OutOfRange { field: "order total", .. })
        ));
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.total_price(), before);
    }

    #[test]
    fn test_price_snapshot_survives_price_change() {
        let mut order = create_order();
        let mut p = product(1000);
        order.add_or_update_item(&p, Quantity::units(2)).unwrap();

        p.set_unit_price(Money::from_parts(9900, 2)).unwrap();
        order.recompute_total().unwrap();

        assert_eq!(order.item_for_product(&p.id).unwrap().total_price, Money::from_parts(2000, 2));
        assert_eq!(order.total_price(), Money::from_parts(2000, 2));
    }

    #[test]
    fn test_remove_item_recomputes_total() {
        let mut order = create_order();
        let p = product(1000);
        let q = product(550);
        let item = order.add_or_update_item(&p, Quantity::units(3)).unwrap();
        order.add_or_update_item(&q, Quantity::units(2)).unwrap();

        order.remove_item(item.id).unwrap();
        assert_eq!(order.total_price(), Money::from_parts(1100, 2));
        assert!(order.get_item(item.id).is_none());
    }

    #[test]
    fn test_remove_unknown_item_fails() {
        let mut order = create_order();
        let result = order.remove_item(OrderItemId::new());
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[test]
    fn test_recompute_total_is_idempotent() {
        let mut order = create_order();
        order.add_or_update_item(&product(333), Quantity::from_parts(15, 1)).unwrap();
        order.add_or_update_item(&product(125), Quantity::units(4)).unwrap();

        let first = order.recompute_total().unwrap();
        let second = order.recompute_total().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Money::from_parts(1000, 2));
    }

    #[test]
    fn test_transition_reports_previous_status() {
        let mut order = create_order();
        let change = order.transition_to(OrderStatus::Delivering).unwrap();
        assert_eq!(change.previous, OrderStatus::Preparing);
        assert_eq!(change.current, OrderStatus::Delivering);
        assert!(change.is_change());
        assert!(!change.completes_order());

        let change = order.transition_to(OrderStatus::Completed).unwrap();
        assert!(change.completes_order());
    }

    #[test]
    fn test_resave_terminal_status_is_not_a_change() {
        let mut order = create_order();
        order.transition_to(OrderStatus::Completed).unwrap();

        let change = order.transition_to(OrderStatus::Completed).unwrap();
        assert!(!change.is_change());
        assert!(!change.completes_order());
    }

    #[test]
    fn test_cannot_leave_terminal_status() {
        let mut order = create_order();
        order.transition_to(OrderStatus::Cancelled).unwrap();

        let result = order.transition_to(OrderStatus::Preparing);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStateTransition { .. })
        ));
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_items_frozen_after_completion() {
        let mut order = create_order();
        let p = product(1000);
        let item = order.add_or_update_item(&p, Quantity::units(1)).unwrap();
        order.transition_to(OrderStatus::Completed).unwrap();

        assert!(matches!(
            order.add_or_update_item(&p, Quantity::units(2)),
            Err(DomainError::OrderClosed { .. })
        ));
        assert!(matches!(
            order.remove_item(item.id),
            Err(DomainError::OrderClosed { .. })
        ));
    }

    #[test]
    fn test_confirm_once() {
        let mut order = create_order();
        assert!(order.confirm());
        assert!(!order.confirm());
        assert!(order.is_confirmed());
    }
}
