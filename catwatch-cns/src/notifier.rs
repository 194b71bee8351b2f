//! Notification channel

use crate::error::CnsError;
use async_trait::async_trait;
use catwatch_core::config::NotifierConfig;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::time::Duration;

/// Chat channel receiving sighting messages and burst photos
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), CnsError>;

    /// Send one JPEG photo
    async fn send_photo(&self, jpeg: Vec<u8>) -> Result<(), CnsError>;
}

/// Telegram Bot API client
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, CnsError> {
        if config.bot_token.is_empty() {
            return Err(CnsError::Config("Telegram bot token not set".to_string()));
        }
        if config.chat_id.is_empty() {
            return Err(CnsError::Config("Telegram chat id not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| CnsError::Config(format!("Failed to build Telegram client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn check(response: reqwest::Response) -> Result<(), CnsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CnsError::Api { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<(), CnsError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn send_photo(&self, jpeg: Vec<u8>) -> Result<(), CnsError> {
        let part = Part::bytes(jpeg)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("photo", part);
        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await
    }
}
