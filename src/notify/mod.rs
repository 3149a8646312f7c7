pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::NotifyConfig;
use crate::error::Result;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to the account owner.
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Fallback when no delivery channel is configured: the message only goes
/// to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        tracing::info!(channel = "log", "{message}");
        Ok(())
    }
}

pub fn from_config(config: &NotifyConfig, timeout: Duration) -> Result<Box<dyn Notifier>> {
    match config.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Box::new(webhook::WebhookNotifier::new(
            url,
            &config.title,
            timeout,
        )?)),
        _ => {
            tracing::debug!("No notification channel configured, logging only");
            Ok(Box::new(LogNotifier))
        }
    }
}
