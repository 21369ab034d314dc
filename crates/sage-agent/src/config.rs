use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Startup configuration failures. These are the only fatal errors of the agent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config: failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config: failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// An environment override could not be parsed.
    #[error("Config: invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_control_api")]
    pub control_api: String,
    #[serde(default = "default_prometheus_url")]
    pub prometheus_url: String,
    /// Empty disables chat notifications.
    #[serde(default)]
    pub slack_webhook_url: String,
    #[serde(default = "default_drone_bridge_url")]
    pub drone_bridge_url: String,
    /// Wallet service queried directly when the metrics backend has no
    /// entities. Empty disables the fallback.
    #[serde(default = "default_o2_wallet_api")]
    pub o2_wallet_api: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub o2: O2Config,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct O2Config {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tte_alert_minutes")]
    pub tte_alert_minutes: f64,
    /// Noise floor in tokens per hour.
    #[serde(default = "default_min_drain_tph")]
    pub min_drain_tph: f64,
    #[serde(default = "default_corr_min_wallets")]
    pub corr_min_wallets: usize,
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: u64,
    #[serde(default = "default_wallet")]
    pub default_wallet: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_rule_confidence")]
    pub rule: f64,
    #[serde(default = "default_predictive_confidence")]
    pub predictive: f64,
    #[serde(default = "default_correlation_confidence")]
    pub correlation: f64,
    #[serde(default = "default_trend_confidence")]
    pub trend: f64,
}

fn default_control_api() -> String {
    "http://control-api:8000".to_string()
}

fn default_prometheus_url() -> String {
    "http://prometheus:9090".to_string()
}

fn default_drone_bridge_url() -> String {
    "http://drone-bridge:8090".to_string()
}

fn default_o2_wallet_api() -> String {
    "http://ifp-o2-wallet:8085".to_string()
}

fn default_interval_secs() -> u64 {
    30
}

fn default_http_port() -> u16 {
    8055
}

fn default_true() -> bool {
    true
}

fn default_tte_alert_minutes() -> f64 {
    30.0
}

fn default_min_drain_tph() -> f64 {
    50.0
}

fn default_corr_min_wallets() -> usize {
    3
}

fn default_alert_cooldown_secs() -> u64 {
    900
}

fn default_wallet() -> String {
    "0x638C70f337fc63DB0E108308E3dD60f71eb97342".to_string()
}

fn default_rule_confidence() -> f64 {
    0.95
}

fn default_predictive_confidence() -> f64 {
    0.9
}

fn default_correlation_confidence() -> f64 {
    0.8
}

fn default_trend_confidence() -> f64 {
    0.75
}

impl Default for O2Config {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            tte_alert_minutes: default_tte_alert_minutes(),
            min_drain_tph: default_min_drain_tph(),
            corr_min_wallets: default_corr_min_wallets(),
            alert_cooldown_secs: default_alert_cooldown_secs(),
            default_wallet: default_wallet(),
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            rule: default_rule_confidence(),
            predictive: default_predictive_confidence(),
            correlation: default_correlation_confidence(),
            trend: default_trend_confidence(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            control_api: default_control_api(),
            prometheus_url: default_prometheus_url(),
            slack_webhook_url: String::new(),
            drone_bridge_url: default_drone_bridge_url(),
            o2_wallet_api: default_o2_wallet_api(),
            interval_secs: default_interval_secs(),
            http_port: default_http_port(),
            o2: O2Config::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

impl AgentConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Optional TOML file, then the process environment on top.
    pub fn from_sources(path: Option<&str>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        base.with_env(&env)
    }

    /// Applies environment overrides from `env`. Unset variables keep the
    /// current value; set but unparseable ones are an error.
    pub fn with_env(mut self, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if let Some(v) = env.get("CONTROL_API") {
            self.control_api = v.clone();
        }
        if let Some(v) = env.get("PROMETHEUS_URL") {
            self.prometheus_url = v.clone();
        }
        if let Some(v) = env.get("SLACK_WEBHOOK_URL") {
            self.slack_webhook_url = v.clone();
        }
        if let Some(v) = env.get("DRONE_BRIDGE_URL") {
            self.drone_bridge_url = v.clone();
        }
        if let Some(v) = env.get("O2_WALLET_API") {
            self.o2_wallet_api = v.clone();
        }
        if let Some(v) = env.get("SAGE_INTERVAL_S") {
            self.interval_secs = parse_env("SAGE_INTERVAL_S", v)?;
        }
        if let Some(v) = env.get("SAGE_HTTP_PORT") {
            self.http_port = parse_env("SAGE_HTTP_PORT", v)?;
        }
        if let Some(v) = env.get("O2_MONITORING_ENABLED") {
            self.o2.enabled = parse_bool("O2_MONITORING_ENABLED", v)?;
        }
        if let Some(v) = env.get("O2_TTE_ALERT_MINUTES") {
            self.o2.tte_alert_minutes = parse_env("O2_TTE_ALERT_MINUTES", v)?;
        }
        if let Some(v) = env.get("O2_MIN_DRAIN_TPH") {
            self.o2.min_drain_tph = parse_env("O2_MIN_DRAIN_TPH", v)?;
        }
        if let Some(v) = env.get("O2_CORR_MIN_WALLETS") {
            self.o2.corr_min_wallets = parse_env("O2_CORR_MIN_WALLETS", v)?;
        }
        if let Some(v) = env.get("O2_ALERT_COOLDOWN_SEC") {
            self.o2.alert_cooldown_secs = parse_env("O2_ALERT_COOLDOWN_SEC", v)?;
        }
        if let Some(v) = env.get("O2_DEFAULT_WALLET") {
            self.o2.default_wallet = v.clone();
        }
        Ok(self)
    }

    pub fn prometheus_enabled(&self) -> bool {
        !self.prometheus_url.is_empty()
    }

    pub fn slack_enabled(&self) -> bool {
        !self.slack_webhook_url.is_empty()
    }
}
