//! Shop users as known to the Telegram bot.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

/// User name stored when the Telegram account has none.
pub const DEFAULT_USER_NAME: &str = "no username";

/// A customer of the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Telegram chat id; where status notifications are delivered.
    pub telegram_id: Option<String>,
    pub first_name: Option<String>,
    pub user_name: String,
    pub age: Option<u32>,
    pub phone_number: Option<String>,
    pub is_registered: bool,
    /// Preferred language code, e.g. "uz" or "ru".
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates an unregistered user.
    pub fn new(telegram_id: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            telegram_id: telegram_id.filter(|t| !t.trim().is_empty()),
            first_name: None,
            user_name: DEFAULT_USER_NAME.to_string(),
            age: None,
            phone_number: None,
            is_registered: false,
            language: None,
            created_at,
        }
    }

    /// Returns the address notifications can be sent to, if any.
    pub fn notification_address(&self) -> Option<&str> {
        self.telegram_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Applies the fields present in `patch`.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(telegram_id) = patch.telegram_id {
            self.telegram_id = Some(telegram_id).filter(|t| !t.trim().is_empty());
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(user_name) = patch.user_name {
            self.user_name = user_name;
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(phone_number) = patch.phone_number {
            self.phone_number = Some(phone_number);
        }
        if let Some(is_registered) = patch.is_registered {
            self.is_registered = is_registered;
        }
        if let Some(language) = patch.language {
            self.language = Some(language);
        }
    }
}

/// Partial update of a user; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub telegram_id: Option<String>,
    pub first_name: Option<String>,
    pub user_name: Option<String>,
    pub age: Option<u32>,
    pub phone_number: Option<String>,
    pub is_registered: Option<bool>,
    pub language: Option<String>,
}
