//! Metric source adapters for the sage agent.
//!
//! Each [`SourceAdapter`] reads one kind of telemetry from the metrics
//! backend and converts it into a [`ServiceMap`]. Adapters fail softly: a
//! transport or payload error is logged and the adapter contributes nothing
//! for that cycle. [`merge`] combines the per-adapter maps.

pub mod control;
pub mod merge;
pub mod prometheus;
pub mod sensors;
pub mod targets;
pub mod wallet;
pub mod wallet_api;


use async_trait::async_trait;
use sage_common::types::ServiceMap;

/// A telemetry source polled once per cycle.
///
/// Implementations are run sequentially by [`collect_all`]; the trait
/// requires `Send + Sync` so the adapter set can live in the driver task.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Returns the adapter name (e.g., `"wallet"`, `"targets"`), used for logging.
    fn name(&self) -> &str;

    /// Collects the current state contributed by this source.
    ///
    /// Never fails: any backend error yields an empty map.
    async fn collect(&self) -> ServiceMap;
}

/// Runs every adapter in order and merges their output left to right.
pub async fn collect_all(adapters: &[Box<dyn SourceAdapter>]) -> ServiceMap {
    let mut services = ServiceMap::new();
    for adapter in adapters {
        let contributed = adapter.collect().await;
        tracing::debug!(
            adapter = adapter.name(),
            entities = contributed.len(),
            "Collected source"
        );
        services = merge::merge_services(services, contributed);
    }
    services
}
