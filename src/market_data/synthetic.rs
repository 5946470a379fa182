use crate::types::pool::{LockInfo, Pool, TokenInfo};

/// Deterministic placeholder batch for total provider outage. Every record is
/// tagged `synthetic = true` and carries zeroed market data, so it keeps the
/// ranking pipeline alive without ever qualifying under any real criteria.
pub fn placeholder_batch(chain: &str, exchange: &str, count: usize) -> Vec<Pool> {
    (0..count)
        .map(|i| Pool {
            chain: chain.to_string(),
            exchange: exchange.to_string(),
            pair_address: format!("0x{:040x}", 0xff00_0000u64 + i as u64),
            base_token: TokenInfo {
                address: format!("0x{:040x}", i as u64 + 1),
                symbol: format!("SYN{i}"),
                name: format!("Synthetic placeholder {i}"),
                decimals: 18,
            },
            quote_token: TokenInfo {
                address: String::new(),
                symbol: "WNATIVE".to_string(),
                name: String::new(),
                decimals: 18,
            },
            liquidity_usd: 0.0,
            volume_usd: 0.0,
            market_cap_usd: 0.0,
            holder_count: 0,
            buy_tax_pct: 0.0,
            sell_tax_pct: 0.0,
            is_honeypot: false,
            lock: LockInfo::default(),
            created_at_unix: 0,
            synthetic: true,
        })
        .collect()
}
