//! Order service: order placement, line items and status transitions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use domain::{
    AddOrUpdateItem, DomainError, Notification, Order, OrderStatusNotice, PlaceOrder, Product,
    RemoveItem, StatusChange, StockAdjustment, StockReconciler, TransitionStatus,
};
use notifications::NotificationSink;
use store::{OrderQuery, Store, StoreExt, Transaction};

use crate::catalog::low_stock_notice;
use crate::error::Result;

/// Result of a status transition.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    /// The order as committed.
    pub order: Order,
    pub change: StatusChange,
    /// Stock deducted by this transition; empty unless it completed the order.
    pub adjustments: Vec<StockAdjustment>,
}

/// Service for managing orders.
pub struct OrderService<S, N> {
    store: S,
    sink: Arc<N>,
    reconciler: StockReconciler,
}

async fn load_order<T: Transaction>(tx: &mut T, id: OrderId) -> Result<Order> {
    tx.get_order(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Order", id).into())
}

async fn load_product<T: Transaction>(tx: &mut T, id: ProductId) -> Result<Product> {
    tx.get_product(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Product", id).into())
}

impl<S: Store, N: NotificationSink> OrderService<S, N> {
    pub fn new(store: S, sink: Arc<N>, reconciler: StockReconciler) -> Self {
        Self {
            store,
            sink,
            reconciler,
        }
    }

    /// Places an empty order in `preparing`.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        if tx.get_user(cmd.user_id).await?.is_none() {
            return Err(DomainError::not_found("User", cmd.user_id).into());
        }

        let order = Order::place(cmd.user_id, Utc::now());
        tx.insert_order(&order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id(), "order placed");
        Ok(order)
    }

    /// Writes the line for a product at the product's current price and
    /// recomputes the order total.
    #[tracing::instrument(skip(self))]
    pub async fn add_or_update_item(&self, cmd: AddOrUpdateItem) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, cmd.order_id).await?;
        let product = load_product(&mut tx, cmd.product_id).await?;

        let item = order.add_or_update_item(&product, cmd.quantity)?;
        tx.save_item(&item).await?;
        tx.update_order_total(&order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Deletes a line item and recomputes the order total.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cmd: RemoveItem) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, cmd.order_id).await?;

        let removed = order.remove_item(cmd.item_id)?;
        tx.delete_item(removed.id).await?;
        tx.update_order_total(&order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Deletes the line of `product_id` and recomputes the order total.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(&self, order_id: OrderId, product_id: ProductId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, order_id).await?;

        let item_id = order
            .item_for_product(&product_id)
            .map(|item| item.id)
            .ok_or_else(|| DomainError::not_found("Order item for product", product_id))?;
        order.remove_item(item_id)?;
        tx.delete_item(item_id).await?;
        tx.update_order_total(&order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Recomputes and stores the order total from its current lines.
    #[tracing::instrument(skip(self))]
    pub async fn recompute_total(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, order_id).await?;
        order.recompute_total()?;
        tx.update_order_total(&order).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Moves an order to a new status.
    ///
    /// The previous status is the one stored when the order row is locked in
    /// this transaction. The first arrival in `completed` deducts the items
    /// from stock; any stock left at or below the low-stock threshold raises
    /// an admin alert. The owner is notified of every actual change. Messages
    /// go out only after the commit.
    #[tracing::instrument(skip(self))]
    pub async fn transition_status(&self, cmd: TransitionStatus) -> Result<StatusTransition> {
        let mut uow = self.store.unit_of_work().await?;
        let mut order = load_order(uow.tx(), cmd.order_id).await?;
        let change = order.transition_to(cmd.status)?;
        if let Some(notice) = OrderStatusNotice::for_change(&order, &change) {
            uow.defer(Notification::OrderStatusChanged(notice));
        }

        let mut adjustments = Vec::new();
        if change.completes_order() {
            // Lock products in id order.
            let mut product_ids: Vec<ProductId> =
                order.items().iter().map(|item| item.product_id).collect();
            product_ids.sort();
            product_ids.dedup();

            let mut products = HashMap::with_capacity(product_ids.len());
            for id in product_ids {
                products.insert(id, load_product(uow.tx(), id).await?);
            }

            adjustments = self
                .reconciler
                .on_status_change(&change, order.items(), &mut products)?;

            for adjustment in &adjustments {
                if let Some(product) = products.get(&adjustment.product_id) {
                    uow.tx().update_product_stock(product).await?;
                }
            }

            let adjusted = adjustments
                .iter()
                .filter_map(|adjustment| products.get(&adjustment.product_id));
            for product in self.reconciler.low_stock(adjusted) {
                let notice = low_stock_notice(uow.tx(), product).await?;
                uow.defer(Notification::LowStock(notice));
            }
        }

        if change.is_change() {
            uow.tx().update_order_status(&order).await?;
        }

        let notifications = uow.commit().await?;
        record_transition(&change, &adjustments);
        tracing::info!(
            order_id = %order.id(),
            previous = %change.previous,
            current = %change.current,
            adjustments = adjustments.len(),
            "order status changed"
        );
        self.sink.dispatch(notifications).await;

        Ok(StatusTransition {
            order,
            change,
            adjustments,
        })
    }

    /// Sets the customer's confirmation flag.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, order_id).await?;
        if order.confirm() {
            tx.update_order_status(&order).await?;
            tx.commit().await?;
        }
        Ok(order)
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        load_order(&mut tx, order_id).await
    }

    pub async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.query_orders(&query).await?)
    }

    /// Lists a user's orders, newest first. An empty result is reported as not found.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.list_orders(OrderQuery::for_user(user_id)).await?;
        if orders.is_empty() {
            return Err(DomainError::not_found("Orders for user", user_id).into());
        }
        Ok(orders)
    }

    /// Deletes an order together with its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_order(order_id).await? {
            return Err(DomainError::not_found("Order", order_id).into());
        }
        tx.commit().await?;
        Ok(())
    }
}

fn record_transition(change: &StatusChange, adjustments: &[StockAdjustment]) {
    if change.completes_order() {
        metrics::counter!("orders_completed_total").increment(1);
    }
    for adjustment in adjustments {
        metrics::counter!("stock_deductions_total").increment(1);
        if adjustment.shortfall {
            metrics::counter!("stock_shortfalls_total").increment(1);
            tracing::warn!(
                product_id = %adjustment.product_id,
                requested = %adjustment.requested,
                available = %adjustment.previous,
                "insufficient stock, clamped to zero"
            );
        }
    }
}
