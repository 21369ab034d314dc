use crate::error::{NotifyError, Result};
use crate::utils::{redact_url, truncate_string, MAX_BODY_LENGTH};
use crate::NotificationChannel;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(4);

/// Incoming-webhook chat channel (Slack style): `POST <url>` with `{"text": ..}`.
///
/// An empty URL disables the channel; sends then fail with
/// [`NotifyError::NotConfigured`] without touching the network.
pub struct WebhookChannel {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty()
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, text: &str) -> Result<()> {
        if !self.is_enabled() {
            tracing::debug!("Chat webhook URL not set; skipping post");
            return Err(NotifyError::NotConfigured("chat webhook"));
        }

        let resp = self
            .client
            .post(self.url.as_str())
            .json(&serde_json::json!({ "text": text }))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(text) => truncate_string(&text, MAX_BODY_LENGTH),
                Err(e) => format!("[Failed to read response body: {e}]"),
            };
            return Err(NotifyError::ApiError {
                service: redact_url(&self.url),
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Chat alert sent");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}
