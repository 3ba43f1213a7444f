//! Domain layer for the shop backend.
//!
//! This crate holds the pure model, free of I/O:
//! - Catalog: categories, product types and products with derived availability
//! - Order aggregate with price-snapshotted line items and a status machine
//! - Stock reconciler applying deductions on order completion
//! - Notification effects to deliver after a write commits

pub mod catalog;
pub mod error;
pub mod notification;
pub mod order;
pub mod stock;
pub mod user;
pub mod value_objects;

pub use catalog::{Category, DEFAULT_UNIT_LABEL, Product, ProductType};
pub use error::{DomainError, parse_id};
pub use notification::{LowStockNotice, Notification, OrderStatusNotice};
pub use order::{
    AddOrUpdateItem, Order, OrderItem, OrderStatus, PlaceOrder, RemoveItem, StatusChange,
    TransitionStatus, UnknownStatus,
};
pub use stock::{DEFAULT_LOW_STOCK_THRESHOLD, StockAdjustment, StockPolicy, StockReconciler};
pub use user::{DEFAULT_USER_NAME, User, UserPatch};
pub use value_objects::{Money, Quantity};
