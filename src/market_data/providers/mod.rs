use anyhow::Result;
use async_trait::async_trait;

use crate::types::pool::{Pool, RankingParams};

pub mod birdeye;
pub mod dexscreener;
pub mod geckoterminal;

/// One third-party market-data source. Each adapter owns the mapping from
/// its provider-specific JSON into the canonical [`Pool`] shape; numeric
/// fields default to 0 on parse failure rather than erroring, so one bad
/// field never blocks a batch.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, params: &RankingParams) -> Result<Vec<Pool>>;
}

/// Parse a numeric field a provider serialized as a JSON string, defaulting
/// to zero when absent or malformed.
pub(crate) fn lenient_f64(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_f64_defaults_on_garbage() {
        assert_eq!(lenient_f64(Some("12.5")), 12.5);
        assert_eq!(lenient_f64(Some("not-a-number")), 0.0);
        assert_eq!(lenient_f64(None), 0.0);
    }
}
