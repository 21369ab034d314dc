use async_trait::async_trait;
pub use sage_common::report::ControlStatus;
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reachability check for the control service.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Never fails: any problem reads as [`ControlStatus::Down`].
    async fn probe(&self) -> ControlStatus;
}

/// Health probe against `<control>/health`.
pub struct ControlProbe {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl ControlProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

#[async_trait]
impl HealthProbe for ControlProbe {
    /// `Up` on any 2xx answer; every other outcome is `Down`.
    async fn probe(&self) -> ControlStatus {
        let result = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => ControlStatus::Up,
            Ok(resp) => {
                tracing::error!(status = %resp.status(), "Control API unhealthy");
                ControlStatus::Down
            }
            Err(e) => {
                tracing::error!(error = %e, "Control API down");
                ControlStatus::Down
            }
        }
    }
}
