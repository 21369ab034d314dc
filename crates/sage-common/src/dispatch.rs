use crate::types::Severity;
use async_trait::async_trait;
use serde::Serialize;

/// Context handed to a drone dispatcher when an infrastructure rule fires.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub entity: String,
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
}

/// Outcome of a dispatch attempt. Serialized as
/// `{"status":"dispatched","missionId":..}` or `{"status":"failed","error":..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DispatchResult {
    Dispatched {
        #[serde(rename = "missionId")]
        mission_id: String,
    },
    Failed {
        error: String,
    },
}

impl DispatchResult {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchResult::Dispatched { .. })
    }
}

/// Sends an inspection mission for an infrastructure entity.
///
/// Implementations never fail outright: transport problems are reported as
/// [`DispatchResult::Failed`].
#[async_trait]
pub trait DroneDispatcher: Send + Sync {
    async fn dispatch(&self, request: &DispatchRequest) -> DispatchResult;
}
