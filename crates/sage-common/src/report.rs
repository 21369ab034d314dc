//! Per-cycle summary shipped to the control service.

use crate::types::{Insight, RuleAction, Severity};
use serde::Serialize;

/// Event type carried by every heartbeat body.
pub const HEARTBEAT_TYPE: &str = "sage_heartbeat";

/// Reachability of the control service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    Up,
    Down,
}

impl ControlStatus {
    /// Contribution of the control service to the coherence score.
    pub fn coherence(&self) -> f64 {
        match self {
            ControlStatus::Up => 1.0,
            ControlStatus::Down => 0.0,
        }
    }
}

impl std::fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlStatus::Up => write!(f, "up"),
            ControlStatus::Down => write!(f, "down"),
        }
    }
}

/// Outcome of walking recent coherence scores until they settle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Convergence {
    /// Number of deltas examined.
    pub depth: usize,
    pub converged: bool,
    pub deltas: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub rule: String,
    pub action: RuleAction,
    pub severity: Severity,
    pub description: String,
}

impl From<&Insight> for Recommendation {
    fn from(insight: &Insight) -> Self {
        Self {
            rule: insight.rule_id.clone(),
            action: insight.action,
            severity: insight.severity,
            description: insight.description.clone(),
        }
    }
}

/// Everything one pipeline cycle produced.
///
/// Insight details may carry wei amounts above `u64::MAX`; serialize with
/// `serde_json::to_string`/`to_vec`, never through `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub control_api: ControlStatus,
    pub control_coherence: f64,
    pub coherence: f64,
    pub convergence: Convergence,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

impl CycleReport {
    pub fn new(
        control_api: ControlStatus,
        coherence: f64,
        convergence: Convergence,
        insights: Vec<Insight>,
    ) -> Self {
        let recommendations = insights.iter().map(Recommendation::from).collect();
        Self {
            control_api,
            control_coherence: control_api.coherence(),
            coherence,
            convergence,
            insights,
            recommendations,
        }
    }
}

/// Heartbeat body: `{type, insights, timestamp}` with a float unix timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Heartbeat<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub insights: &'a CycleReport,
    pub timestamp: f64,
}

impl<'a> Heartbeat<'a> {
    pub fn new(report: &'a CycleReport, at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            kind: HEARTBEAT_TYPE,
            insights: report,
            timestamp: at.timestamp_millis() as f64 / 1000.0,
        }
    }
}
