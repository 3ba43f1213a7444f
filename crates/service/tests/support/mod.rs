//! Shared wiring for the service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use common::{CategoryId, ProductId};
use domain::{Money, Order, PlaceOrder, Quantity, StockPolicy, StockReconciler, User, UserPatch};
use notifications::{InMemoryTransport, NotificationDispatcher, NotifierConfig, StoreDirectory};
use service::{CatalogService, NewProduct, OrderService, UserService};
use store::InMemoryStore;

pub const ADMIN_CHAT: &str = "-100";

pub type Dispatcher = NotificationDispatcher<StoreDirectory<InMemoryStore>>;

pub struct Harness {
    pub store: InMemoryStore,
    pub transport: InMemoryTransport,
    pub orders: OrderService<InMemoryStore, Dispatcher>,
    pub catalog: CatalogService<InMemoryStore, Dispatcher>,
    pub users: UserService<InMemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let transport = InMemoryTransport::new();
        let config = NotifierConfig::default().with_admin_chat_id(ADMIN_CHAT);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(transport.clone()),
            StoreDirectory::new(store.clone()),
            config,
        ));

        Self {
            orders: OrderService::new(
                store.clone(),
                dispatcher.clone(),
                StockReconciler::default(),
            ),
            catalog: CatalogService::new(store.clone(), dispatcher, StockPolicy::default()),
            users: UserService::new(store.clone()),
            store,
            transport,
        }
    }

    pub async fn user(&self, telegram_id: &str) -> User {
        self.users
            .register(telegram_id, UserPatch::default())
            .await
            .unwrap()
    }

    pub async fn category(&self, name: &str) -> CategoryId {
        self.catalog.create_category(name).await.unwrap().id
    }

    pub async fn product(
        &self,
        category_id: CategoryId,
        name: &str,
        price: Money,
        stock: i64,
    ) -> ProductId {
        self.catalog
            .create_product(NewProduct {
                name: name.to_string(),
                category_id,
                product_type_id: None,
                unit_price: price,
                unit_label: None,
                description: None,
                quantity: Quantity::units(stock),
            })
            .await
            .unwrap()
            .id
    }

    pub async fn order_for(&self, user: &User) -> Order {
        self.orders.place_order(PlaceOrder::new(user.id)).await.unwrap()
    }
}
