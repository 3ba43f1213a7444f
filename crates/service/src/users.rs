//! User service.

use chrono::Utc;
use common::UserId;
use domain::{DomainError, User, UserPatch};
use store::{Store, Transaction};

use crate::error::{Result, ServiceError};

/// Service for users known to the bot.
pub struct UserService<S> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user with `telegram_id`, creating it from `patch` if there is none.
    #[tracing::instrument(skip(self, patch))]
    pub async fn register(&self, telegram_id: &str, patch: UserPatch) -> Result<User> {
        let telegram_id = telegram_id.trim();
        if telegram_id.is_empty() {
            return Err(DomainError::EmptyField {
                field: "telegram id",
            }
            .into());
        }

        let mut tx = self.store.begin().await?;
        if let Some(existing) = tx.find_user_by_telegram_id(telegram_id).await? {
            return Ok(existing);
        }

        let mut user = User::new(Some(telegram_id.to_string()), Utc::now());
        user.apply(UserPatch {
            telegram_id: None,
            ..patch
        });
        tx.insert_user(&user)
            .await
            .map_err(ServiceError::duplicate("User", telegram_id))?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> Result<User> {
        let mut tx = self.store.begin().await?;
        tx.get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id).into())
    }

    pub async fn get_by_telegram_id(&self, telegram_id: &str) -> Result<User> {
        let mut tx = self.store.begin().await?;
        tx.find_user_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", telegram_id.trim()).into())
    }

    /// Applies the fields present in `patch` to the user with `telegram_id`.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_by_telegram_id(&self, telegram_id: &str, patch: UserPatch) -> Result<User> {
        let mut tx = self.store.begin().await?;
        let mut user = tx
            .find_user_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", telegram_id.trim()))?;

        user.apply(patch);
        let new_id = user.telegram_id.clone().unwrap_or_default();
        tx.update_user(&user)
            .await
            .map_err(ServiceError::duplicate("User", &new_id))?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_users().await?)
    }
}
