//! One observe → evaluate → predict → act cycle, and the components it needs.

use crate::config::AgentConfig;
use chrono::{DateTime, Utc};
use sage_alert::coherence::{
    coherence_score, converge, CoherenceHistory, DEFAULT_CONVERGENCE_DEPTH,
    DEFAULT_CONVERGENCE_THRESHOLD,
};
use sage_alert::rules::{infrastructure_rules, wallet_rules};
use sage_alert::{
    AlertCooldown, InfrastructureEvaluator, PredictiveAnalyzer, PredictiveConfig, RuleEvaluator,
};
use sage_collector::control::{ControlProbe, HealthProbe};
use sage_collector::prometheus::PrometheusClient;
use sage_collector::sensors::{default_sensor_queries, InfrastructureSensorAdapter};
use sage_collector::targets::TargetDiscoveryAdapter;
use sage_collector::wallet::WalletBalanceAdapter;
use sage_collector::wallet_api::{BalanceProvider, WalletApiClient};
use sage_collector::{collect_all, SourceAdapter};
use sage_common::dispatch::DroneDispatcher;
use sage_common::identity::WALLET_PREFIX;
use sage_common::metrics::MetricsBackend;
use sage_common::report::CycleReport;
use sage_notify::channels::webhook::WebhookChannel;
use sage_notify::drone::HttpDroneDispatcher;
use sage_notify::heartbeat::{HeartbeatSink, HttpHeartbeat};
use sage_notify::manager::ActionDispatcher;
use sage_notify::NotificationChannel;
use std::sync::Arc;

/// External collaborators of the pipeline. Production wiring uses HTTP
/// clients; tests substitute in-memory fakes.
pub struct Components {
    pub backend: Arc<dyn MetricsBackend>,
    pub probe: Box<dyn HealthProbe>,
    pub drone: Arc<dyn DroneDispatcher>,
    pub channel: Box<dyn NotificationChannel>,
    pub heartbeat: Box<dyn HeartbeatSink>,
    /// Direct wallet check used when the backend yields no entities.
    pub wallet_api: Option<Box<dyn BalanceProvider>>,
}

impl Components {
    pub fn http(config: &AgentConfig) -> Self {
        Self {
            backend: Arc::new(PrometheusClient::new(config.prometheus_url.clone())),
            probe: Box::new(ControlProbe::new(config.control_api.clone())),
            drone: Arc::new(HttpDroneDispatcher::new(config.drone_bridge_url.clone())),
            channel: Box::new(WebhookChannel::new(config.slack_webhook_url.clone())),
            heartbeat: Box::new(HttpHeartbeat::new(config.control_api.clone())),
            wallet_api: (!config.o2_wallet_api.is_empty()).then(|| {
                Box::new(WalletApiClient::new(config.o2_wallet_api.clone()))
                    as Box<dyn BalanceProvider>
            }),
        }
    }
}

/// The full per-cycle pipeline plus the state carried between cycles
/// (alert cooldowns and coherence history).
pub struct Pipeline {
    probe: Box<dyn HealthProbe>,
    adapters: Vec<Box<dyn SourceAdapter>>,
    wallet_api: Option<Box<dyn BalanceProvider>>,
    wallet_evaluator: Option<RuleEvaluator>,
    infrastructure: InfrastructureEvaluator,
    predictive: Option<PredictiveAnalyzer>,
    drone: Arc<dyn DroneDispatcher>,
    actions: ActionDispatcher,
    cooldown: AlertCooldown,
    history: CoherenceHistory,
    convergence_threshold: f64,
    convergence_depth: usize,
}

impl Pipeline {
    pub fn new(config: &AgentConfig, components: Components) -> Self {
        let Components {
            backend,
            probe,
            drone,
            channel,
            heartbeat,
            wallet_api,
        } = components;

        let mut adapters: Vec<Box<dyn SourceAdapter>> =
            vec![Box::new(TargetDiscoveryAdapter::new(backend.clone()))];
        if config.o2.enabled {
            adapters.push(Box::new(WalletBalanceAdapter::new(
                backend.clone(),
                config.o2.default_wallet.clone(),
            )));
        }
        adapters.push(Box::new(InfrastructureSensorAdapter::new(
            backend.clone(),
            default_sensor_queries(),
        )));

        let (wallet_evaluator, predictive) = if config.o2.enabled {
            let rules = RuleEvaluator::new(wallet_rules()).with_confidence(config.confidence.rule);
            let predictive = PredictiveAnalyzer::new(
                backend,
                PredictiveConfig {
                    tte_alert_minutes: config.o2.tte_alert_minutes,
                    min_drain_rate_per_hour: config.o2.min_drain_tph,
                    correlation_min_wallets: config.o2.corr_min_wallets,
                    tte_confidence: config.confidence.predictive,
                    correlation_confidence: config.confidence.correlation,
                    ..PredictiveConfig::default()
                },
            );
            (Some(rules), Some(predictive))
        } else {
            (None, None)
        };

        Self {
            probe,
            adapters,
            wallet_api: wallet_api.filter(|_| config.o2.enabled),
            wallet_evaluator,
            infrastructure: InfrastructureEvaluator::new(
                infrastructure_rules(),
                config.confidence.rule,
            ),
            predictive,
            drone,
            actions: ActionDispatcher::new(channel, heartbeat),
            cooldown: AlertCooldown::new(config.o2.alert_cooldown_secs),
            history: CoherenceHistory::default().with_trend_confidence(config.confidence.trend),
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            convergence_depth: DEFAULT_CONVERGENCE_DEPTH,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config, Components::http(config))
    }

    pub fn cooldown(&self) -> &AlertCooldown {
        &self.cooldown
    }

    pub fn history(&self) -> &CoherenceHistory {
        &self.history
    }

    /// Runs one cycle end to end. Collaborator failures degrade to missing
    /// data; the cycle itself always produces a report.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let control = self.probe.probe().await;
        let mut services = collect_all(&self.adapters).await;
        if services.is_empty() {
            if let Some(wallet_api) = &self.wallet_api {
                let observation = wallet_api.observe().await;
                tracing::debug!(status = %observation.status, "Using direct wallet API");
                services.insert(WALLET_PREFIX.to_string(), observation.to_state());
            }
        }
        tracing::info!(entities = services.len(), control_api = %control, "Observed");

        let mut insights = Vec::new();
        if let Some(rules) = &self.wallet_evaluator {
            insights.extend(rules.evaluate(&services));
        }
        insights.extend(
            self.infrastructure
                .evaluate(&services, self.drone.as_ref())
                .await,
        );
        if let Some(predictive) = &self.predictive {
            insights.extend(predictive.analyze(&mut self.cooldown, now).await);
        }

        let coherence = coherence_score(control.coherence(), insights.len());
        self.history.push(coherence);
        if let Some(trend) = self.history.trend_insight() {
            insights.push(trend);
        }

        let convergence = converge(
            &self.history.scores(),
            self.convergence_threshold,
            self.convergence_depth,
        );
        if convergence.converged || convergence.depth == 0 {
            tracing::debug!(depth = convergence.depth, "Coherence converged");
        } else {
            tracing::warn!(
                depth = convergence.depth,
                deltas = ?convergence.deltas,
                "Coherence has not converged"
            );
        }

        tracing::info!(
            insights = insights.len(),
            coherence,
            "Reflection complete"
        );

        let report = CycleReport::new(control, coherence, convergence, insights);
        let outcome = self.actions.act(&report).await;
        tracing::debug!(
            notified = outcome.notified,
            heartbeat = outcome.heartbeat_sent,
            "Actions complete"
        );
        report
    }
}
