//! Token/wei unit normalization.
//!
//! Balance gauges are populated by exporters with different native units
//! and no unit metadata, so raw values are classified by magnitude.

/// Number of wei in one whole token.
pub const WEI_PER_TOKEN: f64 = 1e18;

/// Raw balances strictly above this are taken to already be wei.
pub const WEI_MAGNITUDE_CUTOFF: f64 = 1e12;

/// Converts a token amount to wei. Negative and NaN inputs saturate to zero.
///
/// # Examples
///
/// ```
/// use sage_common::units::tokens_to_wei;
///
/// assert_eq!(tokens_to_wei(250.0), 250_000_000_000_000_000_000);
/// ```
pub fn tokens_to_wei(tokens: f64) -> u128 {
    (tokens * WEI_PER_TOKEN) as u128
}

pub fn wei_to_tokens(wei: u128) -> f64 {
    wei as f64 / WEI_PER_TOKEN
}

/// A raw gauge reading after magnitude classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawBalance {
    Wei(u128),
    Tokens(f64),
}

impl RawBalance {
    /// Classifies a raw reading: values above [`WEI_MAGNITUDE_CUTOFF`] are
    /// wei, everything else is whole tokens.
    pub fn classify(raw: f64) -> Self {
        if raw > WEI_MAGNITUDE_CUTOFF {
            RawBalance::Wei(raw as u128)
        } else {
            RawBalance::Tokens(raw)
        }
    }

    pub fn wei(&self) -> u128 {
        match self {
            RawBalance::Wei(wei) => *wei,
            RawBalance::Tokens(tokens) => tokens_to_wei(*tokens),
        }
    }

    pub fn tokens(&self) -> f64 {
        match self {
            RawBalance::Wei(wei) => wei_to_tokens(*wei),
            RawBalance::Tokens(tokens) => *tokens,
        }
    }
}
