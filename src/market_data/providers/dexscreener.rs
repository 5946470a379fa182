use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_derive::Deserialize;
use std::time::Duration;

use crate::market_data::providers::MarketDataProvider;
use crate::types::pool::{LockInfo, Pool, RankingParams, TokenInfo};

const HTTP_TIMEOUT_SECS: u64 = 15;

/// DexScreener-style pairs feed: rich liquidity/volume/mcap data, no
/// token-security fields.
pub struct DexScreenerProvider {
    client: Client,
    base_url: String,
    chain: String,
}

#[derive(Debug, Deserialize)]
struct PairsResponse {
    pairs: Option<Vec<PairRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairRecord {
    chain_id: String,
    dex_id: String,
    pair_address: String,
    base_token: TokenRecord,
    quote_token: TokenRecord,
    #[serde(default)]
    liquidity: Option<LiquidityRecord>,
    #[serde(default)]
    volume: Option<VolumeRecord>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    fdv: Option<f64>,
    /// Milliseconds since epoch.
    #[serde(default)]
    pair_created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenRecord {
    address: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct LiquidityRecord {
    #[serde(default)]
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VolumeRecord {
    #[serde(default)]
    h24: Option<f64>,
}

impl DexScreenerProvider {
    pub fn new(base_url: &str, chain: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            chain: chain.to_string(),
        }
    }
}

fn map_pair(record: PairRecord) -> Pool {
    Pool {
        chain: record.chain_id,
        exchange: record.dex_id,
        pair_address: record.pair_address,
        base_token: TokenInfo {
            address: record.base_token.address,
            symbol: record.base_token.symbol,
            name: record.base_token.name,
            decimals: 18,
        },
        quote_token: TokenInfo {
            address: record.quote_token.address,
            symbol: record.quote_token.symbol,
            name: record.quote_token.name,
            decimals: 18,
        },
        liquidity_usd: record.liquidity.and_then(|l| l.usd).unwrap_or(0.0),
        volume_usd: record.volume.and_then(|v| v.h24).unwrap_or(0.0),
        market_cap_usd: record.market_cap.or(record.fdv).unwrap_or(0.0),
        holder_count: 0,
        buy_tax_pct: 0.0,
        sell_tax_pct: 0.0,
        is_honeypot: false,
        lock: LockInfo::default(),
        created_at_unix: record.pair_created_at.map(|ms| ms / 1000).unwrap_or(0),
        synthetic: false,
    }
}

#[async_trait]
impl MarketDataProvider for DexScreenerProvider {
    fn name(&self) -> &str {
        "dexscreener"
    }

    async fn fetch(&self, _params: &RankingParams) -> Result<Vec<Pool>> {
        let url = format!("{}/latest/dex/pairs/{}", self.base_url, self.chain);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: PairsResponse = response.json().await?;
        Ok(body
            .pairs
            .unwrap_or_default()
            .into_iter()
            .map(map_pair)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_full_pair() {
        let raw = r#"{
            "schemaVersion": "1.0.0",
            "pairs": [{
                "chainId": "ethereum",
                "dexId": "uniswap-v2",
                "pairAddress": "0xPAIR",
                "baseToken": {"address": "0xAAAA", "name": "Foo", "symbol": "FOO"},
                "quoteToken": {"address": "0xWETH", "name": "Wrapped Ether", "symbol": "WETH"},
                "liquidity": {"usd": 50000.0},
                "volume": {"h24": 1234.5},
                "marketCap": 2000000.0,
                "pairCreatedAt": 1700000000000
            }]
        }"#;
        let parsed: PairsResponse = serde_json::from_str(raw).unwrap();
        let pool = map_pair(parsed.pairs.unwrap().remove(0));
        assert_eq!(pool.chain, "ethereum");
        assert_eq!(pool.exchange, "uniswap-v2");
        assert_eq!(pool.liquidity_usd, 50000.0);
        assert_eq!(pool.market_cap_usd, 2000000.0);
        assert_eq!(pool.created_at_unix, 1700000000);
        assert!(!pool.synthetic);
    }

    #[test]
    fn missing_numerics_default_to_zero() {
        let raw = r#"{
            "pairs": [{
                "chainId": "ethereum",
                "dexId": "uniswap-v2",
                "pairAddress": "0xPAIR",
                "baseToken": {"address": "0xAAAA"},
                "quoteToken": {"address": "0xWETH"}
            }]
        }"#;
        let parsed: PairsResponse = serde_json::from_str(raw).unwrap();
        let pool = map_pair(parsed.pairs.unwrap().remove(0));
        assert_eq!(pool.liquidity_usd, 0.0);
        assert_eq!(pool.volume_usd, 0.0);
        assert_eq!(pool.market_cap_usd, 0.0);
        assert_eq!(pool.created_at_unix, 0);
    }

    #[test]
    fn fdv_backfills_market_cap() {
        let raw = r#"{
            "pairs": [{
                "chainId": "ethereum",
                "dexId": "uniswap-v2",
                "pairAddress": "0xPAIR",
                "baseToken": {"address": "0xAAAA"},
                "quoteToken": {"address": "0xWETH"},
                "fdv": 777.0
            }]
        }"#;
        let parsed: PairsResponse = serde_json::from_str(raw).unwrap();
        let pool = map_pair(parsed.pairs.unwrap().remove(0));
        assert_eq!(pool.market_cap_usd, 777.0);
    }
}
