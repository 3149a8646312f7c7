use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};

use super::Notifier;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    content: &'a str,
}

/// Posts messages as JSON `{"title", "content"}` to a push service.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    title: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, title: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            title: title.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                title: &self.title,
                content: message,
            })
            .send()
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notification(format!(
                "webhook returned {status}: {body}"
            )));
        }

        tracing::info!(status = status.as_u16(), "Notification delivered");
        Ok(())
    }
}
