use async_trait::async_trait;
use sage_common::metrics::{ActiveTarget, BackendError, MetricsBackend, Result, Sample};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Per-call timeout for backend requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a Prometheus-compatible backend.
pub struct PrometheusClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl PrometheusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        if self.base_url.is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(timeout)
    } else {
        BackendError::Transport(e.to_string())
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    async fn instant_query(&self, query: &str) -> Result<Vec<Sample>> {
        let body = self.get("/api/v1/query", &[("query", query)]).await?;
        parse_instant_vector(&body)
    }

    async fn active_targets(&self) -> Result<Vec<ActiveTarget>> {
        let body = self.get("/api/v1/targets", &[]).await?;
        parse_active_targets(&body)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct VectorData {
    #[serde(default)]
    result: Vec<RawSample>,
}

#[derive(Deserialize)]
struct RawSample {
    #[serde(default)]
    metric: HashMap<String, String>,
    #[serde(default)]
    value: Vec<Value>,
}

#[derive(Deserialize)]
struct TargetsData {
    #[serde(rename = "activeTargets", default)]
    active_targets: Vec<RawTarget>,
}

#[derive(Deserialize)]
struct RawTarget {
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    health: String,
    #[serde(rename = "lastScrape", default)]
    last_scrape: String,
    #[serde(rename = "scrapeDuration", default)]
    scrape_duration: f64,
}

fn unwrap_envelope<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedPayload(e.to_string()))?;
    if envelope.status != "success" {
        return Err(BackendError::QueryStatus(envelope.status));
    }
    envelope
        .data
        .ok_or_else(|| BackendError::MalformedPayload("missing 'data'".to_string()))
}

/// Parses an instant-query response body.
///
/// Samples whose value is missing, not a string, unparseable, or not finite
/// are dropped individually; the rest of the vector is kept.
pub fn parse_instant_vector(body: &str) -> Result<Vec<Sample>> {
    let data: VectorData = unwrap_envelope(body)?;
    let samples = data
        .result
        .into_iter()
        .filter_map(|raw| {
            let parsed = raw
                .value
                .get(1)
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite());
            match parsed {
                Some(value) => Some(Sample::new(raw.metric, value)),
                None => {
                    tracing::warn!(labels = ?raw.metric, value = ?raw.value, "Skipping unparseable sample");
                    None
                }
            }
        })
        .collect();
    Ok(samples)
}

/// Parses a target-discovery response body.
pub fn parse_active_targets(body: &str) -> Result<Vec<ActiveTarget>> {
    let data: TargetsData = unwrap_envelope(body)?;
    Ok(data
        .active_targets
        .into_iter()
        .map(|t| ActiveTarget {
            labels: t.labels,
            health: t.health,
            last_scrape: t.last_scrape,
            scrape_duration: t.scrape_duration,
        })
        .collect())
}
