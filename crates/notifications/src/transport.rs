//! Message transports: the Telegram Bot API, a log-only transport and an
//! in-memory recorder for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::NotifierConfig;
use crate::error::DeliveryError;

/// How the receiving client should render the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Plain,
    Html,
}

/// Sends one text message to one destination.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), DeliveryError>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

/// Telegram Bot API transport (`sendMessage`).
pub struct TelegramTransport {
    client: Client,
    endpoint: String,
}

impl TelegramTransport {
    /// Creates a transport from the notifier configuration.
    ///
    /// Fails if no bot token is configured.
    pub fn new(config: &NotifierConfig) -> Result<Self, DeliveryError> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| DeliveryError::Config("bot token not configured".to_string()))?;

        let client = Client::builder().timeout(config.send_timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_url.trim_end_matches('/'),
                token
            ),
        })
    }
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), DeliveryError> {
        let body = SendMessage {
            chat_id: destination,
            text,
            parse_mode: match format {
                FormatHint::Plain => None,
                FormatHint::Html => Some("HTML"),
            },
        };

        // The endpoint carries the bot token; keep it out of errors and logs.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Transport that only logs messages; used when no bot token is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        _format: FormatHint,
    ) -> Result<(), DeliveryError> {
        tracing::info!(destination, text, "notification (not sent, no bot token)");
        Ok(())
    }
}

/// A message recorded by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: String,
    pub text: String,
    pub format: FormatHint,
}

#[derive(Debug, Default)]
struct InMemoryTransportState {
    sent: Vec<SentMessage>,
    fail_on_send: bool,
    delay: Option<std::time::Duration>,
}

/// In-memory transport for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<InMemoryTransportState>>,
}

impl InMemoryTransport {
    /// Creates a new in-memory transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the transport to fail every send.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.lock().fail_on_send = fail;
    }

    /// Makes every send wait this long before completing.
    pub fn set_delay(&self, delay: std::time::Duration) {
        self.lock().delay = Some(delay);
    }

    /// Returns the messages sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    /// Returns the messages sent to `destination`.
    pub fn sent_to(&self, destination: &str) -> Vec<SentMessage> {
        self.lock()
            .sent
            .iter()
            .filter(|m| m.destination == destination)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryTransportState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl NotificationTransport for InMemoryTransport {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), DeliveryError> {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.fail_on_send {
            return Err(DeliveryError::Transport("send failed".to_string()));
        }
        state.sent.push(SentMessage {
            destination: destination.to_string(),
            text: text.to_string(),
            format,
        });
        Ok(())
    }
}
