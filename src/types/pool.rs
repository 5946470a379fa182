use serde_derive::{Deserialize, Serialize};

/// One side of a trading pair as reported by the chain or a market-data
/// provider. Addresses are kept as lowercase-comparable strings here because
/// every provider hands them to us as JSON strings; the chain seam parses
/// them into typed addresses only when a transaction is actually built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub is_locked: bool,
    pub percent_locked: f64,
}

/// Canonical pool record, the unit the whole discovery pipeline operates on.
/// Recomputed every discovery cycle, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub chain: String,
    pub exchange: String,
    pub pair_address: String,
    pub base_token: TokenInfo,
    pub quote_token: TokenInfo,
    pub liquidity_usd: f64,
    pub volume_usd: f64,
    pub market_cap_usd: f64,
    pub holder_count: u64,
    pub buy_tax_pct: f64,
    pub sell_tax_pct: f64,
    pub is_honeypot: bool,
    pub lock: LockInfo,
    pub created_at_unix: i64,
    /// Set by the placeholder generator when every provider failed; downstream
    /// consumers must never treat such a record as real market data.
    pub synthetic: bool,
}

impl Pool {
    /// Dedup key within one ranking batch.
    pub fn dedup_key(&self) -> String {
        self.base_token.address.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    MarketCap,
    Volume,
    HolderCount,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingParams {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: usize,
    pub limit: usize,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            sort_by: SortBy::CreatedAt,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: 50,
        }
    }
}

/// One page of ranked pools, as handed to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPools {
    pub pools: Vec<Pool>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub has_more: bool,
}
