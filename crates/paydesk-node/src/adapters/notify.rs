//! Notifiers for the chat transport.

use std::time::Duration;

use async_trait::async_trait;
use paydesk_core::ChatId;
use paydesk_tracker::{Keyboard, Notification, NotifyPort};
use serde::Serialize;
use tracing::{info, warn};

/// Delivery attempts per notification.
const ATTEMPTS: u32 = 2;

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    chat_id: ChatId,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyboard: Option<Keyboard>,
    notification: &'a Notification,
}

/// Posts rendered notifications to a chat transport endpoint.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn send(&self, message: &OutgoingMessage<'_>) -> Result<(), String> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("HTTP {}", response.status()))
        }
    }
}

#[async_trait]
impl NotifyPort for WebhookNotifier {
    async fn notify(&self, target: ChatId, notification: &Notification, keyboard: Option<Keyboard>) {
        let message = OutgoingMessage {
            chat_id: target,
            text: notification.render(),
            keyboard,
            notification,
        };

        for attempt in 1..=ATTEMPTS {
            match self.send(&message).await {
                Ok(()) => return,
                Err(e) => warn!(
                    chat_id = %target,
                    order_id = %notification.order_id,
                    attempt,
                    error = %e,
                    "Notification delivery failed"
                ),
            }
        }
    }
}

/// Writes notifications to the log instead of a chat.
#[derive(Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifyPort for LogNotifier {
    async fn notify(&self, target: ChatId, notification: &Notification, keyboard: Option<Keyboard>) {
        info!(
            chat_id = %target,
            order_id = %notification.order_id,
            category = ?notification.category,
            keyboard = ?keyboard,
            "{}",
            notification.render()
        );
    }
}
