use async_trait::async_trait;
use common::{CategoryId, OrderId, OrderItemId, ProductId, ProductTypeId, UserId};
use domain::{Category, Notification, Order, OrderItem, Product, ProductType, User};

use crate::{OrderQuery, ProductQuery, Result};

/// A backend that hands out transactions.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: Transaction;

    /// Opens a transaction. Dropping it without commit rolls it back.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// Reads and writes performed atomically.
///
/// `get_order` and `get_product` lock the row for the rest of the
/// transaction, so state read through them is the state the commit
/// writes over.
#[async_trait]
pub trait Transaction: Send {
    async fn insert_user(&mut self, user: &User) -> Result<()>;

    async fn update_user(&mut self, user: &User) -> Result<()>;

    async fn get_user(&mut self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_telegram_id(&mut self, telegram_id: &str) -> Result<Option<User>>;

    /// Lists users, oldest first.
    async fn list_users(&mut self) -> Result<Vec<User>>;

    /// Inserts a category. Names are unique.
    async fn insert_category(&mut self, category: &Category) -> Result<()>;

    async fn update_category(&mut self, category: &Category) -> Result<()>;

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists categories by name.
    async fn list_categories(&mut self) -> Result<Vec<Category>>;

    /// Inserts a product type. Names are unique.
    async fn insert_product_type(&mut self, product_type: &ProductType) -> Result<()>;

    async fn get_product_type(&mut self, id: ProductTypeId) -> Result<Option<ProductType>>;

    async fn list_product_types(&mut self, category_id: CategoryId) -> Result<Vec<ProductType>>;

    async fn insert_product(&mut self, product: &Product) -> Result<()>;

    /// Loads and locks a product.
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    async fn query_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>>;

    /// Writes only the product's quantity and availability.
    async fn update_product_stock(&mut self, product: &Product) -> Result<()>;

    /// Writes only the product's unit price.
    async fn update_product_price(&mut self, product: &Product) -> Result<()>;

    /// Inserts the order row. Items are written with [`Transaction::save_item`].
    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Loads and locks an order together with its items.
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    async fn query_orders(&mut self, query: &OrderQuery) -> Result<Vec<Order>>;

    /// Writes only the order's status and confirmation flag.
    async fn update_order_status(&mut self, order: &Order) -> Result<()>;

    /// Writes only the order's total.
    async fn update_order_total(&mut self, order: &Order) -> Result<()>;

    /// Deletes an order and its items. Returns false if it did not exist.
    async fn delete_order(&mut self, id: OrderId) -> Result<bool>;

    /// Inserts or rewrites a line item.
    async fn save_item(&mut self, item: &OrderItem) -> Result<()>;

    /// Deletes a line item. Returns false if it did not exist.
    async fn delete_item(&mut self, id: OrderItemId) -> Result<bool>;

    /// Makes every write of the transaction durable.
    async fn commit(self) -> Result<()>;

    /// Discards every write of the transaction.
    async fn rollback(self) -> Result<()>;
}

/// A transaction plus the notifications it will release.
///
/// Notifications are queued with [`UnitOfWork::defer`] while the
/// transaction runs and are only returned by a successful commit. A
/// dropped unit of work rolls back and discards them.
pub struct UnitOfWork<T: Transaction> {
    tx: T,
    deferred: Vec<Notification>,
}

impl<T: Transaction> UnitOfWork<T> {
    pub fn new(tx: T) -> Self {
        Self {
            tx,
            deferred: Vec::new(),
        }
    }

    /// The underlying transaction.
    pub fn tx(&mut self) -> &mut T {
        &mut self.tx
    }

    /// Queues a notification for delivery after commit.
    pub fn defer(&mut self, notification: Notification) {
        self.deferred.push(notification);
    }

    /// Commits the transaction and releases the queued notifications.
    pub async fn commit(self) -> Result<Vec<Notification>> {
        self.tx.commit().await?;
        Ok(self.deferred)
    }
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait StoreExt: Store {
    /// Opens a transaction wrapped in a [`UnitOfWork`].
    async fn unit_of_work(&self) -> Result<UnitOfWork<Self::Tx>> {
        Ok(UnitOfWork::new(self.begin().await?))
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}
