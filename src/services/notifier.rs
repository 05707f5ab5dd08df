use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::DeliveryError;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers a finished alert text to a chat or channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API `sendMessage`.
#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let res = self
            .http
            .post(&url)
            .json(&json!({ "chat_id": destination, "text": text }))
            .send()
            .await?;

        let status = res.status();
        let reply = res.json::<TelegramReply>().await?;

        if !status.is_success() || !reply.ok {
            let why = reply.description.unwrap_or_else(|| status.to_string());
            return Err(DeliveryError::Rejected(why));
        }
        Ok(())
    }
}

/// Used when no bot is configured: the alert only goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<(), DeliveryError> {
        tracing::info!(destination, "alert (no notification channel configured):\n{}", text);
        Ok(())
    }
}
