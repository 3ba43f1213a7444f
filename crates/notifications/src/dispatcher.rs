//! Turns domain notifications into delivered messages.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use domain::{LowStockNotice, Notification, Order, OrderStatus, OrderStatusNotice, StatusChange};

use crate::config::NotifierConfig;
use crate::directory::UserDirectory;
use crate::error::DeliveryError;
use crate::templates::{Language, MessageCatalog};
use crate::transport::{FormatHint, NotificationTransport};

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Nothing to send, with the reason.
    Skipped(&'static str),
    /// The send failed or timed out; already logged and counted.
    Failed,
}

/// Receives the notifications released by a committed unit of work.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers every notification. Never fails.
    async fn dispatch(&self, notifications: Vec<Notification>);
}

/// Sends status messages to order owners and low-stock alerts to the admin chat.
pub struct NotificationDispatcher<D> {
    transport: Arc<dyn NotificationTransport>,
    directory: D,
    catalog: MessageCatalog,
    config: NotifierConfig,
}

impl<D: UserDirectory> NotificationDispatcher<D> {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        directory: D,
        config: NotifierConfig,
    ) -> Self {
        Self {
            transport,
            directory,
            catalog: MessageCatalog::default(),
            config,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Notifies the owner of `order` that its status went from `previous` to `current`.
    ///
    /// Sends immediately; callers inside a transaction defer an
    /// [`OrderStatusNotice`] on their unit of work instead.
    pub async fn on_order_status_change(
        &self,
        order: &Order,
        previous: OrderStatus,
        current: OrderStatus,
    ) -> Delivery {
        let change = StatusChange {
            order_id: order.id(),
            previous,
            current,
        };
        match OrderStatusNotice::for_change(order, &change) {
            Some(notice) => self.notify_status(&notice).await,
            None => Delivery::Skipped("status unchanged"),
        }
    }

    #[tracing::instrument(skip(self, notice), fields(order_id = %notice.order_id, status = %notice.current))]
    pub async fn notify_status(&self, notice: &OrderStatusNotice) -> Delivery {
        if notice.previous == notice.current {
            return Delivery::Skipped("status unchanged");
        }

        let recipient = match self.directory.lookup(notice.user_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => return Delivery::Skipped("unknown user"),
            Err(error) => return self.failed("order_status", &error),
        };
        let Some(address) = recipient.address else {
            tracing::debug!(user_id = %notice.user_id, "user has no notification address");
            return Delivery::Skipped("no address");
        };

        let language =
            Language::resolve(recipient.language.as_deref(), self.config.default_language);
        let text = self.catalog.order_status_message(language, notice);
        self.deliver("order_status", &address, &text).await
    }

    /// Alerts the admin chat that a product is at or below the low-stock threshold.
    #[tracing::instrument(skip(self, notice), fields(product_id = %notice.product_id))]
    pub async fn on_product_low_stock(&self, notice: &LowStockNotice) -> Delivery {
        metrics::counter!("low_stock_alerts_total").increment(1);

        let Some(admin_chat_id) = self.config.admin_chat_id.as_deref() else {
            tracing::debug!("no admin chat configured, low-stock alert skipped");
            return Delivery::Skipped("no admin chat");
        };
        let text = self
            .catalog
            .low_stock_message(self.config.default_language, notice);
        self.deliver("low_stock", admin_chat_id, &text).await
    }

    async fn deliver(&self, kind: &'static str, destination: &str, text: &str) -> Delivery {
        let timeout = self.config.send_timeout;
        let started = Instant::now();

        let result = tokio::time::timeout(
            timeout,
            self.transport.send(destination, text, FormatHint::Html),
        )
        .await
        .unwrap_or(Err(DeliveryError::Timeout(timeout)));

        metrics::histogram!("notification_send_seconds", "kind" => kind)
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                metrics::counter!("notifications_sent_total", "kind" => kind).increment(1);
                tracing::info!(kind, destination, "notification sent");
                Delivery::Sent
            }
            Err(error) => self.failed(kind, &error),
        }
    }

    fn failed(&self, kind: &'static str, error: &DeliveryError) -> Delivery {
        metrics::counter!("notifications_failed_total", "kind" => kind).increment(1);
        tracing::warn!(kind, %error, "notification delivery failed");
        Delivery::Failed
    }
}

#[async_trait]
impl<D: UserDirectory> NotificationSink for NotificationDispatcher<D> {
    async fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::OrderStatusChanged(notice) => {
                    self.notify_status(&notice).await;
                }
                Notification::LowStock(notice) => {
                    self.on_product_low_stock(&notice).await;
                }
            }
        }
    }
}
