//! Drain-rate extrapolation and multi-wallet correlation.
//!
//! Balances and rates come from two backend recording rules. A wallet is
//! "draining" when its negated rate is at or above the noise floor; only
//! draining wallets get a time-to-empty estimate.

use crate::cooldown::{AlertCooldown, CooldownKey};
use chrono::{DateTime, Utc};
use sage_common::identity::{series_identity, WALLET_PREFIX};
use sage_common::metrics::{fetch_instant_vector, MetricsBackend, Sample};
use sage_common::types::{Insight, InsightDetails, RuleAction, Severity};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const BALANCE_SERIES: &str = "o2_balance_tokens_now";
pub const DRAIN_RATE_SERIES: &str = "o2_drain_rate_tokens_per_hour";

pub const TTE_RULE_ID: &str = "o2_predictive_tte";
pub const CORRELATION_RULE_ID: &str = "o2_correlated_drain";

#[derive(Debug, Clone, PartialEq)]
pub struct PredictiveConfig {
    pub balance_series: String,
    pub drain_rate_series: String,
    /// Time-to-empty below this (minutes) raises a critical alert.
    pub tte_alert_minutes: f64,
    /// Drain rates (tokens/hour) below this are treated as noise.
    pub min_drain_rate_per_hour: f64,
    pub correlation_min_wallets: usize,
    pub tte_confidence: f64,
    pub correlation_confidence: f64,
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            balance_series: BALANCE_SERIES.to_string(),
            drain_rate_series: DRAIN_RATE_SERIES.to_string(),
            tte_alert_minutes: 30.0,
            min_drain_rate_per_hour: 50.0,
            correlation_min_wallets: 3,
            tte_confidence: 0.9,
            correlation_confidence: 0.8,
        }
    }
}

/// Derived per-wallet drain state, recomputed every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainMetrics {
    pub balance_now: f64,
    pub drain_rate_per_hour: f64,
    pub time_to_empty_minutes: Option<f64>,
}

/// Converts a raw balance rate (negative while draining) into a drain rate.
pub fn drain_rate(raw_rate: f64) -> f64 {
    (-raw_rate).max(0.0)
}

/// Minutes until empty at the current drain rate, or `None` below the noise floor.
pub fn time_to_empty_minutes(balance: f64, drain_per_hour: f64, noise_floor: f64) -> Option<f64> {
    if drain_per_hour < noise_floor || drain_per_hour <= 0.0 {
        return None;
    }
    Some(balance / drain_per_hour * 60.0)
}

/// Balances and drain rates for one cycle, keyed by series identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainSnapshot {
    pub balances: BTreeMap<String, f64>,
    pub drains: BTreeMap<String, f64>,
}

impl DrainSnapshot {
    pub fn from_samples(balances: &[Sample], rates: &[Sample]) -> Self {
        Self {
            balances: balances
                .iter()
                .map(|s| (series_identity(&s.labels), s.value))
                .collect(),
            drains: rates
                .iter()
                .map(|s| (series_identity(&s.labels), drain_rate(s.value)))
                .collect(),
        }
    }

    /// Drain metrics for every wallet with a known balance. Wallets with no
    /// rate sample are treated as not draining.
    pub fn metrics(&self, noise_floor: f64) -> BTreeMap<String, DrainMetrics> {
        self.balances
            .iter()
            .map(|(id, balance)| {
                let drain = self.drains.get(id).copied().unwrap_or(0.0);
                let metrics = DrainMetrics {
                    balance_now: *balance,
                    drain_rate_per_hour: drain,
                    time_to_empty_minutes: time_to_empty_minutes(*balance, drain, noise_floor),
                };
                (id.clone(), metrics)
            })
            .collect()
    }

    /// Wallets whose drain rate is at or above the noise floor.
    pub fn draining(&self, noise_floor: f64) -> Vec<(&str, f64)> {
        self.drains
            .iter()
            .filter(|(_, rate)| **rate >= noise_floor && **rate > 0.0)
            .map(|(id, rate)| (id.as_str(), *rate))
            .collect()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub struct PredictiveAnalyzer {
    backend: Arc<dyn MetricsBackend>,
    config: PredictiveConfig,
}

impl PredictiveAnalyzer {
    pub fn new(backend: Arc<dyn MetricsBackend>, config: PredictiveConfig) -> Self {
        Self { backend, config }
    }

    /// Reads both recorded series. A failed query contributes no samples.
    pub async fn fetch(&self) -> DrainSnapshot {
        let balances = fetch_instant_vector(self.backend.as_ref(), &self.config.balance_series).await;
        let rates = fetch_instant_vector(self.backend.as_ref(), &self.config.drain_rate_series).await;
        DrainSnapshot::from_samples(&balances, &rates)
    }

    pub async fn analyze(&self, cooldown: &mut AlertCooldown, now: DateTime<Utc>) -> Vec<Insight> {
        let snapshot = self.fetch().await;
        self.evaluate(&snapshot, cooldown, now)
    }

    /// Raises per-wallet time-to-empty alerts and the correlated-drain alert,
    /// each gated by `cooldown`.
    pub fn evaluate(
        &self,
        snapshot: &DrainSnapshot,
        cooldown: &mut AlertCooldown,
        now: DateTime<Utc>,
    ) -> Vec<Insight> {
        let floor = self.config.min_drain_rate_per_hour;
        let metrics = snapshot.metrics(floor);
        let mut insights = Vec::new();

        tracing::info!(
            tracked = metrics.len(),
            draining = metrics.values().filter(|m| m.time_to_empty_minutes.is_some()).count(),
            "Predictive analytics"
        );

        for (id, m) in &metrics {
            let Some(tte) = m.time_to_empty_minutes else {
                continue;
            };
            if tte >= self.config.tte_alert_minutes {
                continue;
            }

            let entity = format!("{WALLET_PREFIX}:{id}");
            if !cooldown.try_acquire(CooldownKey::entity(entity.clone(), Severity::Critical), now) {
                tracing::debug!(entity = %entity, "Alert cooldown active");
                continue;
            }

            tracing::warn!(
                entity = %entity,
                tte_minutes = tte,
                balance = m.balance_now,
                drain_per_hour = m.drain_rate_per_hour,
                "Predictive alert"
            );
            insights.push(
                Insight::new(
                    TTE_RULE_ID,
                    format!("Wallet will empty in {tte:.0} minutes"),
                    Severity::Critical,
                    RuleAction::Alert,
                    self.config.tte_confidence,
                    vec![entity],
                )
                .with_details(InsightDetails::TimeToEmpty {
                    tte_minutes: round_to(tte, 1),
                    current_balance: round_to(m.balance_now, 2),
                    drain_rate_per_hour: round_to(m.drain_rate_per_hour, 2),
                }),
            );
        }

        let draining = snapshot.draining(floor);
        let min_wallets = self.config.correlation_min_wallets.max(1);
        if draining.len() >= min_wallets {
            if cooldown.try_acquire(CooldownKey::CorrelatedDrain, now) {
                let total: f64 = draining.iter().map(|(_, rate)| rate).sum();
                let description = format!(
                    "Correlated drain: {} wallets draining {total:.0} O2/h total",
                    draining.len()
                );
                tracing::warn!("Pattern detected: {description}");

                let affected = draining
                    .iter()
                    .map(|(id, _)| format!("{WALLET_PREFIX}:{id}"))
                    .collect();
                insights.push(
                    Insight::new(
                        CORRELATION_RULE_ID,
                        description,
                        Severity::Warning,
                        RuleAction::Alert,
                        self.config.correlation_confidence,
                        affected,
                    )
                    .with_details(InsightDetails::CorrelatedDrain {
                        wallet_count: draining.len(),
                        total_drain_rate: round_to(total, 2),
                        min_drain_threshold: floor,
                    }),
                );
            } else {
                tracing::debug!("Correlated drain alert cooldown active");
            }
        }

        insights
    }
}
