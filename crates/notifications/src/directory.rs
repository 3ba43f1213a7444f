//! Recipient lookup.

use async_trait::async_trait;
use common::UserId;
use store::{Store, Transaction};

use crate::error::DeliveryError;

/// Where and in which language to reach a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    pub address: Option<String>,
    pub language: Option<String>,
}

/// Resolves users to recipients.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns None when the user does not exist.
    async fn lookup(&self, user_id: UserId) -> Result<Option<Recipient>, DeliveryError>;
}

/// Directory reading users from a store.
#[derive(Clone)]
pub struct StoreDirectory<S> {
    store: S,
}

impl<S: Store> StoreDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: Store> UserDirectory for StoreDirectory<S> {
    async fn lookup(&self, user_id: UserId) -> Result<Option<Recipient>, DeliveryError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| DeliveryError::Directory(e.to_string()))?;
        let user = tx
            .get_user(user_id)
            .await
            .map_err(|e| DeliveryError::Directory(e.to_string()))?;

        Ok(user.map(|user| Recipient {
            address: user.notification_address().map(str::to_string),
            language: user.language,
        }))
    }
}
