//! Drone-bridge client used for infrastructure inspection missions.

use crate::utils::{truncate_string, MAX_BODY_LENGTH};
use async_trait::async_trait;
use sage_common::dispatch::{DispatchRequest, DispatchResult, DroneDispatcher};
use sage_common::types::Severity;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const MISSION_PATH: &str = "/api/drone/mission";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

/// Takeoff, inspection point, return home.
pub fn default_waypoints() -> Vec<Waypoint> {
    vec![
        Waypoint {
            lat: -35.363261,
            lon: 149.165230,
            alt: 15.0,
        },
        Waypoint {
            lat: -35.363461,
            lon: 149.165430,
            alt: 15.0,
        },
        Waypoint {
            lat: -35.363261,
            lon: 149.165230,
            alt: 10.0,
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRequest {
    pub mission_id: String,
    pub waypoints: Vec<Waypoint>,
    pub reason: String,
    pub priority: u8,
}

impl MissionRequest {
    pub fn from_dispatch(request: &DispatchRequest, waypoints: Vec<Waypoint>, unix_secs: i64) -> Self {
        Self {
            mission_id: format!("sage-{}-{unix_secs}", request.entity),
            waypoints,
            reason: request.description.clone(),
            priority: if request.severity == Severity::Critical { 2 } else { 1 },
        }
    }
}

pub struct HttpDroneDispatcher {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDroneDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }
}

#[async_trait]
impl DroneDispatcher for HttpDroneDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> DispatchResult {
        if self.base_url.is_empty() {
            return DispatchResult::Failed {
                error: "drone bridge is not configured".to_string(),
            };
        }

        let mission = MissionRequest::from_dispatch(
            request,
            default_waypoints(),
            chrono::Utc::now().timestamp(),
        );
        tracing::info!(entity = %request.entity, mission_id = %mission.mission_id, "Dispatching drone");

        let result = self
            .client
            .post(format!("{}{MISSION_PATH}", self.base_url))
            .json(&mission)
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                tracing::info!(mission_id = %mission.mission_id, "Drone dispatched");
                DispatchResult::Dispatched {
                    mission_id: mission.mission_id,
                }
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(status = %status, "Drone dispatch failed");
                DispatchResult::Failed {
                    error: if body.is_empty() {
                        format!("HTTP {}", status.as_u16())
                    } else {
                        truncate_string(&body, MAX_BODY_LENGTH)
                    },
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Drone dispatch error");
                DispatchResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
