use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use sage_common::report::{CycleReport, Heartbeat};
use std::time::Duration;

pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(2);
pub const INGEST_PATH: &str = "/alerts/ingest";

/// Receives the per-cycle report.
#[async_trait]
pub trait HeartbeatSink: Send + Sync {
    async fn beat(&self, report: &CycleReport) -> Result<()>;
}

/// Posts heartbeats to `<control>/alerts/ingest`.
pub struct HttpHeartbeat {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpHeartbeat {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

#[async_trait]
impl HeartbeatSink for HttpHeartbeat {
    async fn beat(&self, report: &CycleReport) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(NotifyError::NotConfigured("control API"));
        }
        // Serialized up front: wei amounts do not fit serde_json::Value.
        let body = serde_json::to_vec(&Heartbeat::new(report, chrono::Utc::now()))?;

        let resp = self
            .client
            .post(format!("{}{INGEST_PATH}", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::ApiError {
                service: "control API".to_string(),
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }
}
