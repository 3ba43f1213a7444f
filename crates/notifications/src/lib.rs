//! Outbound notifications.
//!
//! Order status changes go to the order's owner in their language; low-stock
//! alerts go to the admin chat. Delivery is best-effort: failures and
//! timeouts are logged and counted, never returned to the business operation.

pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod templates;
pub mod transport;

pub use config::NotifierConfig;
pub use directory::{Recipient, StoreDirectory, UserDirectory};
pub use dispatcher::{Delivery, NotificationDispatcher, NotificationSink};
pub use error::DeliveryError;
pub use templates::{Language, MessageCatalog};
pub use transport::{
    FormatHint, InMemoryTransport, LogTransport, NotificationTransport, SentMessage,
    TelegramTransport,
};
