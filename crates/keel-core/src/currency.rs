//! Static currency descriptors.

use serde::{Deserialize, Serialize};

/// Everything the engine needs to know about a currency that is not
/// chain-family behavior: identity, display symbols, unit scaling, and the
/// default position of its key in the derivation tree.
///
/// Chain-family specifics (network parameters, chain id) live on the
/// currency implementations, which take a `CurrencyInfo` as configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    /// Stable identifier, also used to route gateway calls (e.g. `bitcoin`).
    pub id: String,
    /// Human-readable name (e.g. `Bitcoin`).
    pub name: String,
    /// Base-unit ticker symbol (e.g. `BTC`).
    pub symbol: String,
    /// Minimal-unit symbol (e.g. `satoshi`, `wei`).
    pub minimal_unit_symbol: String,
    /// Number of decimal places between base and minimal unit.
    /// Must be at most 28 to stay within exact decimal range.
    pub decimals: u32,
    /// Default hierarchical derivation path for this currency's key.
    pub default_derivation_path: String,
}

impl CurrencyInfo {
    /// Two amounts are only comparable when their currency ids match.
    pub fn same_currency(&self, other: &CurrencyInfo) -> bool {
        self.id == other.id
    }
}
