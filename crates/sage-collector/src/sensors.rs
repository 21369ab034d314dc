use crate::SourceAdapter;
use async_trait::async_trait;
use sage_common::metrics::{fetch_instant_vector, MetricsBackend};
use sage_common::types::{FieldValue, ServiceMap};
use std::sync::Arc;

/// How a sensor reading is written into service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Raw numeric reading.
    Gauge,
    /// Up/down indicator: `1` becomes `"online"`, anything else `"offline"`.
    Status,
}

/// One backend query feeding one state field.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorQuery {
    pub query: String,
    pub field: String,
    pub kind: SensorKind,
}

impl SensorQuery {
    pub fn gauge(query: &str, field: &str) -> Self {
        Self {
            query: query.to_string(),
            field: field.to_string(),
            kind: SensorKind::Gauge,
        }
    }

    pub fn status(query: &str, field: &str) -> Self {
        Self {
            query: query.to_string(),
            field: field.to_string(),
            kind: SensorKind::Status,
        }
    }

    fn field_value(&self, reading: f64) -> FieldValue {
        match self.kind {
            SensorKind::Gauge => FieldValue::Number(reading),
            SensorKind::Status if reading == 1.0 => "online".into(),
            SensorKind::Status => "offline".into(),
        }
    }
}

pub fn default_sensor_queries() -> Vec<SensorQuery> {
    vec![
        SensorQuery::gauge("hvac_temp", "hvac_temp"),
        SensorQuery::status("hvac_up", "hvac_status"),
        SensorQuery::gauge("power_watts", "power_watts"),
    ]
}

/// Reads infrastructure sensor gauges, keyed by each sample's `service` label.
pub struct InfrastructureSensorAdapter {
    backend: Arc<dyn MetricsBackend>,
    queries: Vec<SensorQuery>,
}

impl InfrastructureSensorAdapter {
    pub fn new(backend: Arc<dyn MetricsBackend>, queries: Vec<SensorQuery>) -> Self {
        Self { backend, queries }
    }
}

#[async_trait]
impl SourceAdapter for InfrastructureSensorAdapter {
    fn name(&self) -> &str {
        "sensors"
    }

    async fn collect(&self) -> ServiceMap {
        let mut services = ServiceMap::new();

        for sensor in &self.queries {
            for sample in fetch_instant_vector(self.backend.as_ref(), &sensor.query).await {
                let Some(service) = sample.label("service").filter(|s| !s.is_empty()) else {
                    tracing::debug!(query = %sensor.query, "Sensor sample without service label");
                    continue;
                };
                services
                    .entry(service.to_string())
                    .or_default()
                    .insert(sensor.field.clone(), sensor.field_value(sample.value));
            }
        }

        services
    }
}
