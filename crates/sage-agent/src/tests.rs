use crate::config::{AgentConfig, ConfigError};
use crate::state::AppState;
use chrono::Utc;
use sage_common::report::{ControlStatus, Convergence, CycleReport};
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn defaults_match_deployment() {
    let config = AgentConfig::default();
    assert_eq!(config.control_api, "http://control-api:8000");
    assert_eq!(config.prometheus_url, "http://prometheus:9090");
    assert_eq!(config.drone_bridge_url, "http://drone-bridge:8090");
    assert_eq!(config.o2_wallet_api, "http://ifp-o2-wallet:8085");
    assert_eq!(config.interval_secs, 30);
    assert_eq!(config.http_port, 8055);
    assert!(config.o2.enabled);
    assert_eq!(config.o2.tte_alert_minutes, 30.0);
    assert_eq!(config.o2.min_drain_tph, 50.0);
    assert_eq!(config.o2.corr_min_wallets, 3);
    assert_eq!(config.o2.alert_cooldown_secs, 900);
    assert_eq!(config.confidence.rule, 0.95);
    assert_eq!(config.confidence.trend, 0.75);
    assert!(!config.slack_enabled());
    assert!(config.prometheus_enabled());
}

#[test]
fn empty_toml_uses_defaults() {
    let config: AgentConfig = toml::from_str("").unwrap();
    assert_eq!(config, AgentConfig::default());
}

#[test]
fn toml_sections_override_defaults() {
    let config: AgentConfig = toml::from_str(
        r#"
        interval_secs = 10
        slack_webhook_url = "https://hooks.example.com/T/B/X"

        [o2]
        enabled = false
        corr_min_wallets = 5

        [confidence]
        predictive = 0.5
        "#,
    )
    .unwrap();

    assert_eq!(config.interval_secs, 10);
    assert!(config.slack_enabled());
    assert!(!config.o2.enabled);
    assert_eq!(config.o2.corr_min_wallets, 5);
    assert_eq!(config.o2.min_drain_tph, 50.0);
    assert_eq!(config.confidence.predictive, 0.5);
    assert_eq!(config.confidence.correlation, 0.8);
}

#[test]
fn environment_overrides_apply() {
    let config = AgentConfig::default()
        .with_env(&env(&[
            ("PROMETHEUS_URL", ""),
            ("SAGE_INTERVAL_S", "15"),
            ("O2_MONITORING_ENABLED", "false"),
            ("O2_TTE_ALERT_MINUTES", "45.5"),
            ("O2_ALERT_COOLDOWN_SEC", "60"),
            ("O2_DEFAULT_WALLET", "0xabc"),
            ("O2_WALLET_API", ""),
        ]))
        .unwrap();

    assert!(!config.prometheus_enabled());
    assert_eq!(config.interval_secs, 15);
    assert!(!config.o2.enabled);
    assert_eq!(config.o2.tte_alert_minutes, 45.5);
    assert_eq!(config.o2.alert_cooldown_secs, 60);
    assert_eq!(config.o2.default_wallet, "0xabc");
    assert!(config.o2_wallet_api.is_empty());
    assert_eq!(config.control_api, "http://control-api:8000");
}

#[test]
fn invalid_numeric_environment_is_rejected() {
    let err = AgentConfig::default()
        .with_env(&env(&[("O2_CORR_MIN_WALLETS", "three")]))
        .unwrap_err();
    match err {
        ConfigError::InvalidEnv { var, value } => {
            assert_eq!(var, "O2_CORR_MIN_WALLETS");
            assert_eq!(value, "three");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(AgentConfig::default()
        .with_env(&env(&[("O2_MONITORING_ENABLED", "maybe")]))
        .is_err());
}

#[test]
fn missing_config_file_is_a_read_error() {
    let err = AgentConfig::load("/nonexistent/sage.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn state_publishes_latest_cycle() {
    let state = AppState::new(&AgentConfig::default());
    assert_eq!(state.snapshot().last_cycle, None);

    let report = CycleReport::new(
        ControlStatus::Up,
        0.8,
        Convergence {
            depth: 0,
            converged: false,
            deltas: Vec::new(),
        },
        Vec::new(),
    );
    let at = Utc::now();
    state.clone().publish(&report, at);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.last_cycle, Some(at));
    assert_eq!(snapshot.coherence, Some(0.8));
}
