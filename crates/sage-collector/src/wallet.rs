use crate::SourceAdapter;
use async_trait::async_trait;
use sage_common::identity::{wallet_key, wallet_label};
use sage_common::metrics::{fetch_instant_vector, MetricsBackend};
use sage_common::types::{FieldValue, ServiceMap, ServiceState};
use sage_common::units::RawBalance;
use std::sync::Arc;

/// Gauge holding raw wallet balances (wei or whole tokens, exporter-dependent).
pub const BALANCE_METRIC: &str = "o2_wallet_balance";

/// Canonical wei balance, always an integer.
pub const FIELD_BALANCE_WEI: &str = "balance_wei";
/// Token balance kept for display.
pub const FIELD_BALANCE_TOKENS: &str = "balance_tokens";
/// Legacy token balance. Rules only read it through normalization.
pub const FIELD_BALANCE_LEGACY: &str = "balance";

/// Reads wallet balances from a gauge and classifies their units.
pub struct WalletBalanceAdapter {
    backend: Arc<dyn MetricsBackend>,
    default_address: String,
}

impl WalletBalanceAdapter {
    pub fn new(backend: Arc<dyn MetricsBackend>, default_address: impl Into<String>) -> Self {
        Self {
            backend,
            default_address: default_address.into(),
        }
    }
}

/// Fields written for one wallet reading.
pub fn wallet_state(address: &str, raw: RawBalance) -> ServiceState {
    let wei = raw.wei();
    let tokens = raw.tokens();
    let status = if wei == 0 { "degraded" } else { "healthy" };

    let mut state = ServiceState::new();
    state.insert(FIELD_BALANCE_WEI.into(), FieldValue::Integer(wei));
    state.insert(FIELD_BALANCE_TOKENS.into(), FieldValue::Number(tokens));
    state.insert("status".into(), status.into());
    state.insert("wallet_address".into(), address.into());
    state.insert(FIELD_BALANCE_LEGACY.into(), FieldValue::Number(tokens));
    state
}

#[async_trait]
impl SourceAdapter for WalletBalanceAdapter {
    fn name(&self) -> &str {
        "wallet"
    }

    async fn collect(&self) -> ServiceMap {
        let samples = fetch_instant_vector(self.backend.as_ref(), BALANCE_METRIC).await;
        let mut services = ServiceMap::new();

        for sample in samples {
            let address = wallet_label(&sample.labels).unwrap_or(self.default_address.as_str());
            let raw = RawBalance::classify(sample.value);
            tracing::debug!(address, raw = sample.value, wei = raw.wei(), "Wallet balance");
            services.insert(wallet_key(address), wallet_state(address, raw));
        }

        services
    }
}
