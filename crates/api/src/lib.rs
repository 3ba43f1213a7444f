//! HTTP adapter for the shop backend.
//!
//! Exposes the order, catalog and user services over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{StockPolicy, StockReconciler};
use metrics_exporter_prometheus::PrometheusHandle;
use notifications::{
    NotificationDispatcher, NotificationTransport, NotifierConfig, StoreDirectory,
};
use service::{CatalogService, OrderService, UserService};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Dispatcher resolving recipients from the same store the services write to.
pub type Dispatcher<S> = NotificationDispatcher<StoreDirectory<S>>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S, Dispatcher<S>>,
    pub catalog: CatalogService<S, Dispatcher<S>>,
    pub users: UserService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/users",
            post(routes::users::register::<S>).get(routes::users::list::<S>),
        )
        .route(
            "/users/{telegram_id}",
            get(routes::users::get::<S>).patch(routes::users::update::<S>),
        )
        .route("/users/{telegram_id}/orders", get(routes::orders::for_user::<S>))
        .route(
            "/categories",
            post(routes::catalog::create_category::<S>).get(routes::catalog::list_categories::<S>),
        )
        .route("/categories/{id}", put(routes::catalog::rename_category::<S>))
        .route(
            "/categories/{id}/types",
            post(routes::catalog::create_product_type::<S>)
                .get(routes::catalog::list_product_types::<S>),
        )
        .route(
            "/categories/{id}/products",
            get(routes::catalog::products_in_category::<S>),
        )
        .route(
            "/products",
            post(routes::catalog::create_product::<S>).get(routes::catalog::list_products::<S>),
        )
        .route("/products/{id}", get(routes::catalog::get_product::<S>))
        .route("/products/{id}/price", put(routes::catalog::set_price::<S>))
        .route("/products/{id}/stock", put(routes::catalog::set_stock::<S>))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>).delete(routes::orders::delete::<S>),
        )
        .route("/orders/{id}/items", put(routes::orders::put_item::<S>))
        .route(
            "/orders/{id}/items/{item_id}",
            axum::routing::delete(routes::orders::remove_item::<S>),
        )
        .route("/orders/{id}/total", post(routes::orders::recompute_total::<S>))
        .route("/orders/{id}/status", put(routes::orders::set_status::<S>))
        .route("/orders/{id}/confirm", post(routes::orders::confirm::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the services over `store`, sharing one notification dispatcher.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    transport: Arc<dyn NotificationTransport>,
    notifier: NotifierConfig,
    policy: StockPolicy,
) -> Arc<AppState<S>> {
    let dispatcher = Arc::new(NotificationDispatcher::new(
        transport,
        StoreDirectory::new(store.clone()),
        notifier,
    ));

    Arc::new(AppState {
        orders: OrderService::new(
            store.clone(),
            dispatcher.clone(),
            StockReconciler::new(policy),
        ),
        catalog: CatalogService::new(store.clone(), dispatcher, policy),
        users: UserService::new(store),
    })
}
