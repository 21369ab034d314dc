use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// One element of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: HashMap<String, String>,
    pub value: f64,
}

impl Sample {
    pub fn new(labels: HashMap<String, String>, value: f64) -> Self {
        Self { labels, value }
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(|s| s.as_str())
    }
}

/// A scrape target reported by the backend's target-discovery API.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTarget {
    pub labels: HashMap<String, String>,
    pub health: String,
    pub last_scrape: String,
    pub scrape_duration: f64,
}

/// Failures talking to the metrics backend.
///
/// # Examples
///
/// ```rust
/// use sage_common::metrics::BackendError;
///
/// let err = BackendError::QueryStatus("error".to_string());
/// assert!(err.to_string().contains("error"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No backend URL is configured.
    #[error("metrics backend is not configured")]
    NotConfigured,

    /// Connection refused, DNS failure and similar transport problems.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with a non-2xx HTTP status.
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response envelope carried a status other than `success`.
    #[error("query status was '{0}'")]
    QueryStatus(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Convenience `Result` alias for backend calls.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Pull-based metrics backend.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Runs an instant query and returns the resulting vector.
    async fn instant_query(&self, query: &str) -> Result<Vec<Sample>>;

    /// Lists the currently active scrape targets.
    async fn active_targets(&self) -> Result<Vec<ActiveTarget>>;
}

/// Runs an instant query, degrading any failure to an empty vector.
///
/// The error is logged here; callers only ever see "no data this cycle".
pub async fn fetch_instant_vector(backend: &dyn MetricsBackend, query: &str) -> Vec<Sample> {
    match backend.instant_query(query).await {
        Ok(samples) => samples,
        Err(BackendError::NotConfigured) => {
            tracing::debug!(query, "Metrics backend not configured, skipping query");
            Vec::new()
        }
        Err(e) => {
            tracing::error!(query, error = %e, "Instant query failed, treating as empty");
            Vec::new()
        }
    }
}
