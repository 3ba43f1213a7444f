//! Transactional persistence for the shop.
//!
//! - [`Store`] / [`Transaction`] traits: every read and write happens inside a transaction
//! - [`UnitOfWork`]: a transaction plus the notifications to deliver once it commits
//! - [`InMemoryStore`] for tests and local runs, [`PostgresStore`] for production

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use query::{OrderQuery, ProductQuery};
pub use store::{Store, StoreExt, Transaction, UnitOfWork};
