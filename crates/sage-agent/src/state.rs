use crate::config::AgentConfig;
use chrono::{DateTime, Utc};
use sage_common::report::CycleReport;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// What the health endpoint knows about the most recent cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSnapshot {
    pub last_cycle: Option<DateTime<Utc>>,
    pub coherence: Option<f64>,
}

/// State shared between the driver loop (sole writer) and the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub interval_secs: u64,
    pub o2_monitoring: bool,
    pub prometheus_enabled: bool,
    pub slack_enabled: bool,
    snapshot: Arc<RwLock<CycleSnapshot>>,
}

impl AppState {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            interval_secs: config.interval_secs,
            o2_monitoring: config.o2.enabled,
            prometheus_enabled: config.prometheus_enabled(),
            slack_enabled: config.slack_enabled(),
            snapshot: Arc::new(RwLock::new(CycleSnapshot::default())),
        }
    }

    pub fn publish(&self, report: &CycleReport, at: DateTime<Utc>) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        snapshot.last_cycle = Some(at);
        snapshot.coherence = Some(report.coherence);
    }

    pub fn snapshot(&self) -> CycleSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
