//! Application services.
//!
//! Each write runs in one unit of work: domain rules are applied to state
//! read inside the transaction, the result is written back, and the
//! notifications queued on the unit are handed to the sink only after the
//! commit succeeded. A validation or not-found error drops the transaction,
//! so nothing is written and nothing is sent.

pub mod catalog;
pub mod error;
pub mod orders;
pub mod users;

pub use catalog::{CatalogService, NewProduct};
pub use error::{Result, ServiceError};
pub use orders::{OrderService, StatusTransition};
pub use users::UserService;
