use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_derive::Deserialize;
use std::time::Duration;

use crate::market_data::providers::{lenient_f64, MarketDataProvider};
use crate::types::pool::{LockInfo, Pool, RankingParams, TokenInfo};

const HTTP_TIMEOUT_SECS: u64 = 15;

/// GeckoTerminal-style new-pools feed. Numbers arrive as JSON strings and
/// token references as prefixed ids (`eth_0xabc...`), so the mapping here is
/// deliberately forgiving.
pub struct GeckoTerminalProvider {
    client: Client,
    base_url: String,
    network: String,
}

#[derive(Debug, Deserialize)]
struct NewPoolsResponse {
    #[serde(default)]
    data: Vec<PoolResource>,
}

#[derive(Debug, Deserialize)]
struct PoolResource {
    attributes: PoolAttributes,
    #[serde(default)]
    relationships: Option<Relationships>,
}

#[derive(Debug, Deserialize)]
struct PoolAttributes {
    address: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    reserve_in_usd: Option<String>,
    #[serde(default)]
    market_cap_usd: Option<String>,
    #[serde(default)]
    volume_usd: Option<VolumeWindow>,
    #[serde(default)]
    pool_created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VolumeWindow {
    #[serde(default)]
    h24: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Relationships {
    #[serde(default)]
    base_token: Option<ResourceRef>,
    #[serde(default)]
    quote_token: Option<ResourceRef>,
    #[serde(default)]
    dex: Option<ResourceRef>,
}

#[derive(Debug, Deserialize)]
struct ResourceRef {
    data: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    id: String,
}

impl GeckoTerminalProvider {
    pub fn new(base_url: &str, network: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            network: network.to_string(),
        }
    }
}

/// Strips the network prefix from ids like `eth_0xabc...`; ids without a
/// prefix pass through unchanged.
fn strip_network_prefix(id: &str) -> String {
    id.split('_').last().unwrap_or(id).to_string()
}

fn map_resource(resource: PoolResource, network: &str) -> Pool {
    let attrs = resource.attributes;
    let relationships = resource.relationships;
    let token_address = |pick: fn(&Relationships) -> &Option<ResourceRef>| -> String {
        relationships
            .as_ref()
            .and_then(|r| pick(r).as_ref())
            .map(|r| strip_network_prefix(&r.data.id))
            .unwrap_or_default()
    };

    // "FOO / WETH": the pool name carries the only symbol hint this feed has
    let base_symbol = attrs
        .name
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    let created_at_unix = attrs
        .pool_created_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp())
        .unwrap_or(0);

    Pool {
        chain: network.to_string(),
        exchange: relationships
            .as_ref()
            .and_then(|r| r.dex.as_ref())
            .map(|d| d.data.id.clone())
            .unwrap_or_default(),
        pair_address: attrs.address,
        base_token: TokenInfo {
            address: token_address(|r| &r.base_token),
            symbol: base_symbol,
            name: String::new(),
            decimals: 18,
        },
        quote_token: TokenInfo {
            address: token_address(|r| &r.quote_token),
            symbol: String::new(),
            name: String::new(),
            decimals: 18,
        },
        liquidity_usd: lenient_f64(attrs.reserve_in_usd.as_deref()),
        volume_usd: lenient_f64(attrs.volume_usd.as_ref().and_then(|v| v.h24.as_deref())),
        market_cap_usd: lenient_f64(attrs.market_cap_usd.as_deref()),
        holder_count: 0,
        buy_tax_pct: 0.0,
        sell_tax_pct: 0.0,
        is_honeypot: false,
        lock: LockInfo::default(),
        created_at_unix,
        synthetic: false,
    }
}

#[async_trait]
impl MarketDataProvider for GeckoTerminalProvider {
    fn name(&self) -> &str {
        "geckoterminal"
    }

    async fn fetch(&self, _params: &RankingParams) -> Result<Vec<Pool>> {
        let url = format!("{}/networks/{}/new_pools", self.base_url, self.network);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: NewPoolsResponse = response.json().await?;
        let network = self.network.clone();
        Ok(body
            .data
            .into_iter()
            .map(|resource| map_resource(resource, &network))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_string_numerics_and_ids() {
        let raw = r#"{
            "data": [{
                "attributes": {
                    "address": "0xPOOL",
                    "name": "FOO / WETH",
                    "reserve_in_usd": "50000.5",
                    "market_cap_usd": "2000000",
                    "volume_usd": {"h24": "123.4"},
                    "pool_created_at": "2024-05-01T12:00:00Z"
                },
                "relationships": {
                    "base_token": {"data": {"id": "eth_0xAAAA", "type": "token"}},
                    "quote_token": {"data": {"id": "eth_0xWETH", "type": "token"}},
                    "dex": {"data": {"id": "uniswap-v2", "type": "dex"}}
                }
            }]
        }"#;
        let parsed: NewPoolsResponse = serde_json::from_str(raw).unwrap();
        let pool = map_resource(parsed.data.into_iter().next().unwrap(), "ethereum");
        assert_eq!(pool.base_token.address, "0xAAAA");
        assert_eq!(pool.base_token.symbol, "FOO");
        assert_eq!(pool.exchange, "uniswap-v2");
        assert_eq!(pool.liquidity_usd, 50000.5);
        assert_eq!(pool.market_cap_usd, 2000000.0);
        assert!(pool.created_at_unix > 0);
    }

    #[test]
    fn malformed_numbers_degrade_to_zero() {
        let raw = r#"{
            "data": [{
                "attributes": {
                    "address": "0xPOOL",
                    "name": "FOO / WETH",
                    "reserve_in_usd": "n/a",
                    "market_cap_usd": null,
                    "pool_created_at": "yesterday"
                }
            }]
        }"#;
        let parsed: NewPoolsResponse = serde_json::from_str(raw).unwrap();
        let pool = map_resource(parsed.data.into_iter().next().unwrap(), "ethereum");
        assert_eq!(pool.liquidity_usd, 0.0);
        assert_eq!(pool.market_cap_usd, 0.0);
        assert_eq!(pool.created_at_unix, 0);
    }
}
