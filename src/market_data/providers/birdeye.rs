use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_derive::Deserialize;
use std::time::Duration;

use crate::market_data::providers::MarketDataProvider;
use crate::types::pool::{LockInfo, Pool, RankingParams, TokenInfo};

const HTTP_TIMEOUT_SECS: u64 = 15;

/// Birdeye-style listings feed; the only source in the fan-out that carries
/// token-security data (taxes, honeypot verdict, LP lock) and holder counts.
pub struct BirdeyeProvider {
    client: Client,
    base_url: String,
    chain: String,
}

#[derive(Debug, Deserialize)]
struct ListingsResponse {
    #[serde(default)]
    data: Option<ListingsData>,
}

#[derive(Debug, Deserialize)]
struct ListingsData {
    #[serde(default)]
    items: Vec<ListingRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingRecord {
    address: String,
    #[serde(default)]
    dex: String,
    base_address: String,
    #[serde(default)]
    base_symbol: String,
    #[serde(default)]
    base_name: String,
    #[serde(default)]
    base_decimals: Option<u8>,
    #[serde(default)]
    quote_address: String,
    #[serde(default)]
    quote_symbol: String,
    #[serde(default)]
    liquidity: Option<f64>,
    #[serde(default, rename = "v24hUSD")]
    v24h_usd: Option<f64>,
    #[serde(default)]
    mc: Option<f64>,
    #[serde(default)]
    holder: Option<u64>,
    #[serde(default)]
    buy_tax: Option<f64>,
    #[serde(default)]
    sell_tax: Option<f64>,
    #[serde(default)]
    is_honeypot: Option<bool>,
    #[serde(default)]
    lp_locked: Option<bool>,
    #[serde(default)]
    lp_locked_pct: Option<f64>,
    #[serde(default)]
    created_at: Option<i64>,
}

impl BirdeyeProvider {
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

fn map_listing(record: ListingRecord, chain: &str) -> Pool {
    Pool {
        chain: chain.to_string(),
        exchange: record.dex,
        pair_address: record.address,
        base_token: TokenInfo {
            address: record.base_address,
            symbol: record.base_symbol,
            name: record.base_name,
            decimals: record.base_decimals.unwrap_or(18),
        },
        quote_token: TokenInfo {
            address: record.quote_address,
            symbol: record.quote_symbol,
            name: String::new(),
            decimals: 18,
        },
        liquidity_usd: record.liquidity.unwrap_or(0.0),
        volume_usd: record.v24h_usd.unwrap_or(0.0),
        market_cap_usd: record.mc.unwrap_or(0.0),
        holder_count: record.holder.unwrap_or(0),
        buy_tax_pct: record.buy_tax.unwrap_or(0.0),
        sell_tax_pct: record.sell_tax.unwrap_or(0.0),
        is_honeypot: record.is_honeypot.unwrap_or(false),
        lock: LockInfo {
            is_locked: record.lp_locked.unwrap_or(false),
            percent_locked: record.lp_locked_pct.unwrap_or(0.0),
        },
        created_at_unix: record.created_at.unwrap_or(0),
        synthetic: false,
    }
}

#[async_trait]
impl MarketDataProvider for BirdeyeProvider {
    fn name(&self) -> &str {
        "birdeye"
    }

    async fn fetch(&self, params: &RankingParams) -> Result<Vec<Pool>> {
        let url = format!(
            "{}/defi/v2/pools/new_listing?chain={}&limit={}",
            self.base_url, self.chain, params.limit
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: ListingsResponse = response.json().await?;
        let chain = self.chain.clone();
        Ok(body
            .data
            .map(|d| d.items)
            .unwrap_or_default()
            .into_iter()
            .map(|record| map_listing(record, &chain))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_security_fields() {
        let raw = r#"{
            "data": {"items": [{
                "address": "0xPOOL",
                "dex": "uniswap-v2",
                "baseAddress": "0xAAAA",
                "baseSymbol": "FOO",
                "baseName": "Foo Token",
                "baseDecimals": 9,
                "quoteAddress": "0xWETH",
                "quoteSymbol": "WETH",
                "liquidity": 50000.0,
                "v24hUSD": 999.0,
                "mc": 2000000.0,
                "holder": 321,
                "buyTax": 2.0,
                "sellTax": 2.5,
                "isHoneypot": true,
                "lpLocked": true,
                "lpLockedPct": 95.5,
                "createdAt": 1700000000
            }]}
        }"#;
        let parsed: ListingsResponse = serde_json::from_str(raw).unwrap();
        let record = parsed.data.unwrap().items.into_iter().next().unwrap();
        let pool = map_listing(record, "ethereum");
        assert_eq!(pool.base_token.decimals, 9);
        assert_eq!(pool.holder_count, 321);
        assert_eq!(pool.buy_tax_pct, 2.0);
        assert_eq!(pool.sell_tax_pct, 2.5);
        assert!(pool.is_honeypot);
        assert!(pool.lock.is_locked);
        assert_eq!(pool.lock.percent_locked, 95.5);
    }

    #[test]
    fn empty_payload_yields_no_records() {
        let parsed: ListingsResponse = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(parsed.data.is_none());
    }
}
