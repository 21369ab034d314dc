use crate::SourceAdapter;
use async_trait::async_trait;
use sage_common::metrics::{ActiveTarget, BackendError, MetricsBackend};
use sage_common::types::{FieldValue, ServiceMap, ServiceState};
use std::sync::Arc;

/// Discovers every scrape target known to the backend and records its health.
pub struct TargetDiscoveryAdapter {
    backend: Arc<dyn MetricsBackend>,
}

impl TargetDiscoveryAdapter {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }
}

/// Entity key and fields for one discovered target.
pub fn target_state(target: &ActiveTarget) -> (String, ServiceState) {
    let job = target.labels.get("job").map_or("unknown", |s| s.as_str());
    let instance = target.labels.get("instance").map_or("unknown", |s| s.as_str());
    let status = if target.health == "up" {
        "healthy"
    } else {
        "degraded"
    };

    let mut state = ServiceState::new();
    state.insert("job".into(), job.into());
    state.insert("instance".into(), instance.into());
    state.insert("health".into(), target.health.as_str().into());
    state.insert("status".into(), status.into());
    state.insert("last_scrape".into(), target.last_scrape.as_str().into());
    state.insert(
        "scrape_duration_seconds".into(),
        FieldValue::Number(target.scrape_duration),
    );
    state.insert(
        "labels".into(),
        FieldValue::Labels(target.labels.clone().into_iter().collect()),
    );

    (format!("{job}:{instance}"), state)
}

#[async_trait]
impl SourceAdapter for TargetDiscoveryAdapter {
    fn name(&self) -> &str {
        "targets"
    }

    async fn collect(&self) -> ServiceMap {
        let targets = match self.backend.active_targets().await {
            Ok(targets) => targets,
            Err(BackendError::NotConfigured) => {
                tracing::debug!("Metrics backend not configured, skipping target discovery");
                return ServiceMap::new();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to collect scrape targets");
                return ServiceMap::new();
            }
        };
        tracing::info!(count = targets.len(), "Discovered scrape targets");

        targets.iter().map(target_state).collect()
    }
}
