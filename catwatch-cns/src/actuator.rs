//! Actuator control

use crate::error::CnsError;
use async_trait::async_trait;
use catwatch_core::config::ActuatorConfig;
use std::time::Duration;
use tracing::info;

/// Deterrent device toggled while a cat is present
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn start(&self) -> Result<(), CnsError>;

    async fn stop(&self) -> Result<(), CnsError>;
}

/// Microcontroller exposing `GET /start` and `GET /stop`
pub struct HttpActuator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpActuator {
    pub fn new(config: &ActuatorConfig) -> Result<Self, CnsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| CnsError::Config(format!("Failed to build actuator client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn signal(&self, command: &str) -> Result<(), CnsError> {
        let url = format!("{}/{}", self.base_url, command);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CnsError::Api { status: status.as_u16(), body });
        }
        info!("Signal /{} sent to actuator", command);
        Ok(())
    }
}

#[async_trait]
impl Actuator for HttpActuator {
    async fn start(&self) -> Result<(), CnsError> {
        self.signal("start").await
    }

    async fn stop(&self) -> Result<(), CnsError> {
        self.signal("stop").await
    }
}
