use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

/// Caps requested for a proxy wallet at deployment time. The deployed
/// contract enforces them on-chain; the application never re-checks them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyWalletConfig {
    pub max_trade_amount: U256,
    pub max_slippage_pct: f64,
    pub daily_trade_limit: U256,
}

/// A deployed per-user proxy contract holding delegated, capped spending
/// authority. Exactly one live proxy exists per (user_address, owner_identity)
/// pair; creation is a lookup-then-create, never a blind insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyWallet {
    pub user_address: Address,
    pub owner_identity: String,
    pub proxy_address: Address,
    pub max_trade_amount: U256,
    pub max_slippage_pct: f64,
    pub daily_trade_limit: U256,
    pub is_active: bool,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Executed,
    Failed,
}

/// Parameters of a swap routed through the proxy's trade entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRequest {
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub min_amount_out: U256,
    /// Unix deadline the proxy rejects the swap after.
    pub deadline: u64,
}

/// Terminal record of a trade attempt. Written exactly once, only when the
/// attempt reaches EXECUTED or FAILED; nothing is persisted mid-flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyTrade {
    pub trade_id: Uuid,
    pub user_address: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub deadline: u64,
    pub status: TradeStatus,
    pub tx_hash: H256,
    pub executed_at: DateTime<Utc>,
}

/// Spending allowance granted to the proxy for one token. Upserted, keyed by
/// (user_address, token_address).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyApproval {
    pub user_address: Address,
    pub token_address: Address,
    pub amount: U256,
    pub updated_at: DateTime<Utc>,
}

/// Everything a collaborator gets back from `get_proxy_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub wallet: ProxyWallet,
    pub approvals: Vec<ProxyApproval>,
    pub trades: Vec<ProxyTrade>,
}
