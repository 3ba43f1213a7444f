//! Shared types for the shop backend.

pub mod types;

pub use types::{
    CategoryId, OrderId, OrderItemId, ProductId, ProductTypeId, UserId,
};
