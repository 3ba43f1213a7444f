use std::time::Duration;

use crate::templates::Language;

/// Telegram Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Notifier configuration, injected into the transport and dispatcher.
///
/// Read from environment variables with sensible defaults:
/// - `TELEGRAM_BOT_TOKEN`: bot token (default: unset, messages are only logged)
/// - `TELEGRAM_ADMIN_CHAT_ID`: chat receiving low-stock alerts (default: unset, alerts skipped)
/// - `TELEGRAM_API_URL`: Bot API base URL (default: `"https://api.telegram.org"`)
/// - `NOTIFY_TIMEOUT_SECS`: per-message send timeout (default: `5`)
/// - `DEFAULT_LANGUAGE`: language for users without one and for admin alerts (default: `"uz"`)
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub bot_token: Option<String>,
    pub admin_chat_id: Option<String>,
    pub api_url: String,
    pub send_timeout: Duration,
    pub default_language: Language,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            admin_chat_id: None,
            api_url: DEFAULT_API_URL.to_string(),
            send_timeout: Duration::from_secs(5),
            default_language: Language::default(),
        }
    }
}

impl NotifierConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            admin_chat_id: non_empty_var("TELEGRAM_ADMIN_CHAT_ID"),
            api_url: non_empty_var("TELEGRAM_API_URL").unwrap_or(defaults.api_url),
            send_timeout: std::env::var("NOTIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.send_timeout),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .ok()
                .and_then(|code| Language::from_code(&code))
                .unwrap_or(defaults.default_language),
        }
    }

    pub fn with_bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    pub fn with_admin_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.admin_chat_id = Some(chat_id.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
