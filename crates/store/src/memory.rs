use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, OrderId, OrderItemId, ProductId, ProductTypeId, UserId};
use domain::{Category, Money, Order, OrderItem, OrderStatus, Product, ProductType, User};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    OrderQuery, ProductQuery, Result, StoreError,
    store::{Store, Transaction},
};

/// Stored order columns; items live in their own table.
#[derive(Debug, Clone)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    is_confirmed: bool,
    total_price: Money,
}

impl OrderRow {
    fn from_order(order: &Order) -> Self {
        Self {
            id: order.id(),
            user_id: order.user_id(),
            created_at: order.created_at(),
            status: order.status(),
            is_confirmed: order.is_confirmed(),
            total_price: order.total_price(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ShopState {
    users: Vec<User>,
    categories: HashMap<CategoryId, Category>,
    product_types: HashMap<ProductTypeId, ProductType>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, OrderRow>,
    // Insertion order is the item order of an order.
    items: Vec<OrderItem>,
}

impl ShopState {
    fn load_order(&self, row: &OrderRow) -> Order {
        let items = self
            .items
            .iter()
            .filter(|item| item.order_id == row.id)
            .cloned()
            .collect();
        Order::restore(
            row.id,
            row.user_id,
            row.created_at,
            row.status,
            row.is_confirmed,
            row.total_price,
            items,
        )
    }

    fn order_row_mut(&mut self, id: OrderId) -> Result<&mut OrderRow> {
        self.orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::row_not_found("Order", id))
    }

    fn product_mut(&mut self, id: ProductId) -> Result<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| StoreError::row_not_found("Product", id))
    }
}

/// In-memory store implementation for testing.
///
/// A transaction holds the store lock from `begin` until it ends, so
/// transactions are serialized. Writes go to a private copy of the state,
/// taken on the first write, and replace the shared state on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<ShopState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail and discard its writes.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Returns the committed state of a product.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.state.lock().await.products.get(&id).cloned()
    }

    /// Returns the committed state of an order.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        let state = self.state.lock().await;
        state.orders.get(&id).map(|row| state.load_order(row))
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        Ok(InMemoryTransaction {
            guard,
            staged: None,
            fail_next_commit: self.fail_next_commit.clone(),
        })
    }
}

/// Transaction over an [`InMemoryStore`].
///
/// Reads see the locked state until the first write, which copies the whole
/// state. A write transaction therefore costs O(state size); read-only ones
/// copy nothing.
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<ShopState>,
    staged: Option<ShopState>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    fn state(&self) -> &ShopState {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    fn staged_mut(&mut self) -> &mut ShopState {
        self.staged.get_or_insert_with(|| ShopState::clone(&self.guard))
    }

    /// Returns true once the transaction has written anything.
    #[cfg(test)]
    fn has_writes(&self) -> bool {
        self.staged.is_some()
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn insert_user(&mut self, user: &User) -> Result<()> {
        if let Some(telegram_id) = user.notification_address()
            && self.state().users.iter().any(|u| {
                u.id != user.id && u.notification_address() == Some(telegram_id)
            })
        {
            return Err(StoreError::UniqueViolation("users_telegram_id_key".into()));
        }
        if self.state().users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::UniqueViolation("users_pkey".into()));
        }
        self.staged_mut().users.push(user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        if let Some(telegram_id) = user.notification_address()
            && self.state().users.iter().any(|u| {
                u.id != user.id && u.notification_address() == Some(telegram_id)
            })
        {
            return Err(StoreError::UniqueViolation("users_telegram_id_key".into()));
        }
        let stored = self
            .staged_mut()
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| StoreError::row_not_found("User", user.id))?;
        *stored = user.clone();
        Ok(())
    }

    async fn get_user(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_telegram_id(&mut self, telegram_id: &str) -> Result<Option<User>> {
        let telegram_id = telegram_id.trim();
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.notification_address() == Some(telegram_id))
            .cloned())
    }

    async fn list_users(&mut self) -> Result<Vec<User>> {
        let mut users = self.state().users.clone();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert_category(&mut self, category: &Category) -> Result<()> {
        if self.state().categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::UniqueViolation("categories_name_key".into()));
        }
        self.staged_mut().categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        if self
            .state()
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(StoreError::UniqueViolation("categories_name_key".into()));
        }
        let stored = self
            .staged_mut()
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| StoreError::row_not_found("Category", category.id))?;
        stored.name = category.name.clone();
        Ok(())
    }

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state().categories.get(&id).cloned())
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>> {
        let mut categories: Vec<_> = self.state().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_product_type(&mut self, product_type: &ProductType) -> Result<()> {
        if !self.state().categories.contains_key(&product_type.category_id) {
            return Err(StoreError::ForeignKeyViolation(
                "product_types_category_id_fkey".into(),
            ));
        }
        if self
            .state()
            .product_types
            .values()
            .any(|t| t.name == product_type.name)
        {
            return Err(StoreError::UniqueViolation("product_types_name_key".into()));
        }
        self.staged_mut()
            .product_types
            .insert(product_type.id, product_type.clone());
        Ok(())
    }

    async fn get_product_type(&mut self, id: ProductTypeId) -> Result<Option<ProductType>> {
        Ok(self.state().product_types.get(&id).cloned())
    }

    async fn list_product_types(&mut self, category_id: CategoryId) -> Result<Vec<ProductType>> {
        let mut types: Vec<_> = self
            .state()
            .product_types
            .values()
            .filter(|t| t.category_id == category_id)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        if !self.state().categories.contains_key(&product.category_id) {
            return Err(StoreError::ForeignKeyViolation(
                "products_category_id_fkey".into(),
            ));
        }
        if let Some(type_id) = product.product_type_id
            && !self.state().product_types.contains_key(&type_id)
        {
            return Err(StoreError::ForeignKeyViolation(
                "products_product_type_id_fkey".into(),
            ));
        }
        if self.state().products.contains_key(&product.id) {
            return Err(StoreError::UniqueViolation("products_pkey".into()));
        }
        self.staged_mut().products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state().products.get(&id).cloned())
    }

    async fn query_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self
            .state()
            .products
            .values()
            .filter(|p| query.category_id.is_none_or(|id| p.category_id == id))
            .filter(|p| {
                query
                    .product_type_id
                    .is_none_or(|id| p.product_type_id == Some(id))
            })
            .filter(|p| !query.available_only || p.is_available())
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(products.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_product_stock(&mut self, product: &Product) -> Result<()> {
        let stored = self.staged_mut().product_mut(product.id)?;
        stored.set_on_hand_quantity(product.on_hand_quantity())?;
        Ok(())
    }

    async fn update_product_price(&mut self, product: &Product) -> Result<()> {
        let stored = self.staged_mut().product_mut(product.id)?;
        stored.set_unit_price(product.unit_price())?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        if !self.state().users.iter().any(|u| u.id == order.user_id()) {
            return Err(StoreError::ForeignKeyViolation("orders_user_id_fkey".into()));
        }
        if self.state().orders.contains_key(&order.id()) {
            return Err(StoreError::UniqueViolation("orders_pkey".into()));
        }
        self.staged_mut()
            .orders
            .insert(order.id(), OrderRow::from_order(order));
        Ok(())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self
            .state()
            .orders
            .get(&id)
            .map(|row| self.state().load_order(row)))
    }

    async fn query_orders(&mut self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut rows: Vec<_> = self
            .state()
            .orders
            .values()
            .filter(|o| query.user_id.is_none_or(|id| o.user_id == id))
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| self.state().load_order(row))
            .collect())
    }

    async fn update_order_status(&mut self, order: &Order) -> Result<()> {
        let row = self.staged_mut().order_row_mut(order.id())?;
        row.status = order.status();
        row.is_confirmed = order.is_confirmed();
        Ok(())
    }

    async fn update_order_total(&mut self, order: &Order) -> Result<()> {
        let row = self.staged_mut().order_row_mut(order.id())?;
        row.total_price = order.total_price();
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let existed = self.staged_mut().orders.remove(&id).is_some();
        self.staged_mut().items.retain(|item| item.order_id != id);
        Ok(existed)
    }

    async fn save_item(&mut self, item: &OrderItem) -> Result<()> {
        if !self.state().orders.contains_key(&item.order_id) {
            return Err(StoreError::ForeignKeyViolation(
                "order_items_order_id_fkey".into(),
            ));
        }
        if !self.state().products.contains_key(&item.product_id) {
            return Err(StoreError::ForeignKeyViolation(
                "order_items_product_id_fkey".into(),
            ));
        }
        if self.state().items.iter().any(|i| {
            i.id != item.id && i.order_id == item.order_id && i.product_id == item.product_id
        }) {
            return Err(StoreError::UniqueViolation("unique_order_product".into()));
        }

        let items = &mut self.staged_mut().items;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(stored) => *stored = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    async fn delete_item(&mut self, id: OrderItemId) -> Result<bool> {
        let before = self.state().items.len();
        self.staged_mut().items.retain(|item| item.id != id);
        Ok(self.state().items.len() != before)
    }

    async fn commit(mut self) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::CommitFailed("injected commit failure".into()));
        }
        if let Some(staged) = self.staged {
            *self.guard = staged;
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Quantity;

    async fn seeded() -> (InMemoryStore, User, Category, Product) {
        let store = InMemoryStore::new();
        let user = User::new(Some("1001".into()), Utc::now());
        let category = Category::new("Food").unwrap();
        let product = Product::new("Non", category.id, Money::from_parts(300, 2))
            .unwrap()
            .with_stock(Quantity::units(10))
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.insert_category(&category).await.unwrap();
        tx.insert_product(&product).await.unwrap();
        tx.commit().await.unwrap();

        (store, user, category, product)
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let (store, user, _, product) = seeded().await;
        let order = Order::place(user.id, Utc::now());

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.order(order.id()).await.is_some());
        assert_eq!(
            store.product(product.id).await.unwrap().on_hand_quantity(),
            Quantity::units(10)
        );
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let (store, user, _, _) = seeded().await;
        let order = Order::place(user.id, Utc::now());

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_order(&order).await.unwrap();
        }

        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn reads_do_not_copy_state_until_first_write() {
        let (store, user, _, product) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_product(product.id).await.unwrap().is_some());
        assert_eq!(tx.list_users().await.unwrap().len(), 1);
        assert!(!tx.has_writes());

        let order = Order::place(user.id, Utc::now());
        tx.insert_order(&order).await.unwrap();
        assert!(tx.has_writes());
        assert!(tx.get_order(order.id()).await.unwrap().is_some());
        tx.commit().await.unwrap();

        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn read_only_commit_keeps_state() {
        let (store, _, _, product) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        tx.get_product(product.id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.product(product.id).await.unwrap(), product);
    }

    #[tokio::test]
    async fn injected_commit_failure_discards_writes() {
        let (store, user, _, _) = seeded().await;
        store.fail_next_commit();

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&Order::place(user.id, Utc::now())).await.unwrap();
        let result = tx.commit().await;

        assert!(matches!(result, Err(StoreError::CommitFailed(_))));
        assert_eq!(store.order_count().await, 0);

        // Only the next commit fails.
        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&Order::place(user.id, Utc::now())).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn category_names_are_unique() {
        let (store, _, _, _) = seeded().await;
        let mut tx = store.begin().await.unwrap();

        let result = tx.insert_category(&Category::new("Food").unwrap()).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn order_requires_existing_user() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let result = tx.insert_order(&Order::place(UserId::new(), Utc::now())).await;
        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn items_round_trip_with_order() {
        let (store, user, _, product) = seeded().await;
        let mut order = Order::place(user.id, Utc::now());
        let item = order.add_or_update_item(&product, Quantity::units(2)).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.save_item(&item).await.unwrap();
        tx.update_order_total(&order).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = store.order(order.id()).await.unwrap();
        assert_eq!(loaded.items(), &[item]);
        assert_eq!(loaded.total_price(), Money::from_parts(600, 2));
    }

    #[tokio::test]
    async fn deleting_order_cascades_to_items() {
        let (store, user, _, product) = seeded().await;
        let mut order = Order::place(user.id, Utc::now());
        let item = order.add_or_update_item(&product, Quantity::units(1)).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.save_item(&item).await.unwrap();
        assert!(tx.delete_order(order.id()).await.unwrap());
        assert!(!tx.delete_item(item.id).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn stock_update_only_touches_quantity() {
        let (store, _, _, product) = seeded().await;

        let mut changed = product.clone();
        changed.set_on_hand_quantity(Quantity::zero()).unwrap();
        changed.set_unit_price(Money::from_parts(999, 2)).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.update_product_stock(&changed).await.unwrap();
        tx.commit().await.unwrap();

        let stored = store.product(product.id).await.unwrap();
        assert_eq!(stored.on_hand_quantity(), Quantity::zero());
        assert!(!stored.is_available());
        assert_eq!(stored.unit_price(), Money::from_parts(300, 2));
    }

    #[tokio::test]
    async fn product_query_filters_and_sorts() {
        let (store, _, category, _) = seeded().await;
        let empty = Product::new("Choy", category.id, Money::from_parts(100, 2)).unwrap();
        let other = Category::new("Drinks").unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&empty).await.unwrap();
        tx.insert_category(&other).await.unwrap();

        let all = tx.query_products(&ProductQuery::in_category(category.id)).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Choy", "Non"]);

        let available = tx
            .query_products(&ProductQuery::in_category(category.id).available())
            .await
            .unwrap();
        assert_eq!(available.len(), 1);

        let none = tx.query_products(&ProductQuery::in_category(other.id)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn orders_listed_newest_first() {
        let (store, user, _, _) = seeded().await;
        let older = Order::place(user.id, Utc::now() - chrono::Duration::hours(1));
        let newer = Order::place(user.id, Utc::now());

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&older).await.unwrap();
        tx.insert_order(&newer).await.unwrap();

        let orders = tx.query_orders(&OrderQuery::for_user(user.id)).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id()).collect();
        assert_eq!(ids, [newer.id(), older.id()]);

        let none = tx.query_orders(&OrderQuery::for_user(UserId::new())).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn telegram_ids_are_unique() {
        let (store, _, _, _) = seeded().await;
        let mut tx = store.begin().await.unwrap();

        let duplicate = User::new(Some("1001".into()), Utc::now());
        let result = tx.insert_user(&duplicate).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));

        let found = tx.find_user_by_telegram_id(" 1001 ").await.unwrap();
        assert!(found.is_some());
    }
}
