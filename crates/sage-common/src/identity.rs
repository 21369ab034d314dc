//! Entity identity resolution for wallet telemetry.

use std::collections::HashMap;

/// Identity prefix shared by every wallet entity.
pub const WALLET_PREFIX: &str = "o2-wallet";

/// Canonical entity key for a wallet address: `o2-wallet:<lowercased address>`.
pub fn wallet_key(address: &str) -> String {
    format!("{WALLET_PREFIX}:{}", address.to_lowercase())
}

/// The wallet address carried by a sample, if any: the `wallet` label wins
/// over the `address` label. Empty labels count as absent.
pub fn wallet_label(labels: &HashMap<String, String>) -> Option<&str> {
    ["wallet", "address"]
        .iter()
        .filter_map(|name| labels.get(*name))
        .map(|s| s.as_str())
        .find(|s| !s.is_empty())
}

/// Identity used for the recorded balance/rate series: the lowercased
/// wallet address, else the `service` label, else [`WALLET_PREFIX`].
pub fn series_identity(labels: &HashMap<String, String>) -> String {
    if let Some(address) = wallet_label(labels) {
        return address.to_lowercase();
    }
    labels
        .get("service")
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| WALLET_PREFIX.to_string())
}
