use ethers::types::Address;
use serde_derive::{Deserialize, Serialize};

/// Per-user filter thresholds deciding whether a discovered pool triggers an
/// alert or an automated trade. Long-lived and user-mutable; owned by the
/// collaborator layer, read here through [`crate::storage::SniperConfigStore`].
///
/// Token addresses in `blacklist`/`whitelist` are compared case-insensitively
/// against the pool's base-token address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SniperConfig {
    pub owner_identity: String,
    /// Wallet the user's proxy contract is keyed by. Required for automated
    /// trading, optional for alert-only configs.
    pub user_address: Option<Address>,
    pub target_chains: Vec<String>,
    pub target_dexs: Vec<String>,
    pub min_liquidity: f64,
    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub max_buy_tax: f64,
    pub max_sell_tax: f64,
    pub honeypot_check: bool,
    pub lock_check: bool,
    pub blacklist: Vec<String>,
    pub whitelist: Vec<String>,
    pub is_active: bool,
    /// When set, a match is escalated from alert-only to an automated trade
    /// through the user's proxy wallet.
    pub auto_buy: bool,
    /// Trade size in the chain's native currency.
    pub buy_size_native: f64,
    pub max_slippage_pct: f64,
}

impl Default for SniperConfig {
    fn default() -> Self {
        Self {
            owner_identity: String::new(),
            user_address: None,
            target_chains: vec![],
            target_dexs: vec![],
            min_liquidity: 0.0,
            min_market_cap: 0.0,
            max_market_cap: f64::MAX,
            max_buy_tax: 100.0,
            max_sell_tax: 100.0,
            honeypot_check: true,
            lock_check: false,
            blacklist: vec![],
            whitelist: vec![],
            is_active: true,
            auto_buy: false,
            buy_size_native: 0.0,
            max_slippage_pct: 5.0,
        }
    }
}
