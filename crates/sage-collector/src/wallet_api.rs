//! Direct wallet-service check, used when the metrics backend has no data.

use async_trait::async_trait;
use sage_common::types::{FieldValue, ServiceState};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_WALLET_API_TIMEOUT: Duration = Duration::from_secs(3);

/// Problems found while checking the wallet service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletIssue {
    BlockchainDisconnected,
    ServiceTimeout,
    ServiceUnreachable,
    CheckFailed,
}

impl WalletIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletIssue::BlockchainDisconnected => "blockchain_disconnected",
            WalletIssue::ServiceTimeout => "service_timeout",
            WalletIssue::ServiceUnreachable => "service_unreachable",
            WalletIssue::CheckFailed => "check_failed",
        }
    }

    /// Entity status reported when this issue aborts the check.
    fn status(&self) -> &'static str {
        match self {
            WalletIssue::ServiceTimeout => "timeout",
            WalletIssue::ServiceUnreachable => "unreachable",
            WalletIssue::BlockchainDisconnected | WalletIssue::CheckFailed => "error",
        }
    }
}

/// What the wallet service reported this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletObservation {
    /// `healthy`/`degraded` as reported by the service, or `timeout`,
    /// `unreachable`, `error` when the check itself failed.
    pub status: String,
    pub balance: Option<f64>,
    pub balance_wei: Option<u128>,
    pub wallet_address: Option<String>,
    pub issues: Vec<WalletIssue>,
}

impl WalletObservation {
    fn failed(issue: WalletIssue) -> Self {
        Self {
            status: issue.status().to_string(),
            balance: None,
            balance_wei: None,
            wallet_address: None,
            issues: vec![issue],
        }
    }

    /// Entity fields for the observation. Balances are only written when the
    /// service actually reported one.
    pub fn to_state(&self) -> ServiceState {
        let mut state = ServiceState::new();
        state.insert("status".into(), self.status.as_str().into());
        if let Some(wei) = self.balance_wei {
            state.insert("balance_wei".into(), FieldValue::Integer(wei));
        }
        if let Some(balance) = self.balance {
            state.insert("balance".into(), FieldValue::Number(balance));
        }
        if let Some(address) = &self.wallet_address {
            state.insert("wallet_address".into(), address.as_str().into());
        }
        let issues: Vec<&str> = self.issues.iter().map(WalletIssue::as_str).collect();
        state.insert("issues".into(), issues.join(",").into());
        state
    }
}

/// Source of a single wallet's health and balance, bypassing the metrics
/// backend.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Never fails: transport problems are reported as issues.
    async fn observe(&self) -> WalletObservation;
}

#[derive(Deserialize)]
struct HealthBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    blockchain_connected: bool,
}

#[derive(Deserialize)]
struct BalanceBody {
    #[serde(default)]
    balance: f64,
    #[serde(default)]
    balance_wei: Option<u128>,
    #[serde(default)]
    wallet_address: Option<String>,
}

/// Reads `<wallet>/health`, then `<wallet>/api/balance` when healthy.
pub struct WalletApiClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl WalletApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_WALLET_API_TIMEOUT,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, WalletIssue> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| classify(&e))?;
        resp.json::<T>().await.map_err(|e| {
            tracing::warn!(path, error = %e, "Malformed wallet service response");
            classify(&e)
        })
    }

    async fn check(&self) -> Result<WalletObservation, WalletIssue> {
        let health: HealthBody = self.get("/health").await?;
        let mut observation = WalletObservation {
            status: health.status.unwrap_or_else(|| "unknown".to_string()),
            balance: None,
            balance_wei: None,
            wallet_address: None,
            issues: Vec::new(),
        };

        if observation.status == "healthy" {
            let balance: BalanceBody = self.get("/api/balance").await?;
            observation.balance = Some(balance.balance);
            observation.balance_wei = balance.balance_wei;
            observation.wallet_address = balance.wallet_address;
        }
        if !health.blockchain_connected {
            observation.issues.push(WalletIssue::BlockchainDisconnected);
        }
        Ok(observation)
    }
}

fn classify(e: &reqwest::Error) -> WalletIssue {
    if e.is_timeout() {
        WalletIssue::ServiceTimeout
    } else if e.is_connect() {
        WalletIssue::ServiceUnreachable
    } else {
        WalletIssue::CheckFailed
    }
}

#[async_trait]
impl BalanceProvider for WalletApiClient {
    async fn observe(&self) -> WalletObservation {
        match self.check().await {
            Ok(observation) => observation,
            Err(issue) => {
                tracing::error!(issue = issue.as_str(), "Wallet service check failed");
                WalletObservation::failed(issue)
            }
        }
    }
}
