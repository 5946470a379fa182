use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::market_data::providers::MarketDataProvider;
use crate::market_data::synthetic;
use crate::types::pool::{Pool, RankingParams};

/// Run every task to completion with an individual timeout and collect the
/// successes; a failed or timed-out task contributes zero items without
/// aborting the batch.
pub async fn settle_all<T, Fut>(tasks: Vec<(String, Fut)>, per_call_timeout: Duration) -> Vec<T>
where
    Fut: Future<Output = anyhow::Result<Vec<T>>> + Send,
    T: Send,
{
    let settled = join_all(tasks.into_iter().map(|(label, fut)| async move {
        match tokio::time::timeout(per_call_timeout, fut).await {
            Ok(Ok(items)) => {
                debug!(source = %label, count = items.len(), "source settled");
                items
            }
            Ok(Err(e)) => {
                warn!(source = %label, error = %e, "source failed, contributing zero records");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    source = %label,
                    timeout_s = per_call_timeout.as_secs(),
                    "source timed out, contributing zero records"
                );
                Vec::new()
            }
        }
    }))
    .await;
    settled.into_iter().flatten().collect()
}

/// Fans out to every configured provider in parallel and unions the results.
/// Ranking needs the full candidate set, so the union is only formed once
/// every provider has settled; there is no racing-ahead on first response.
pub struct MarketDataAggregator {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    per_provider_timeout: Duration,
    chain: String,
    exchange: String,
}

impl MarketDataAggregator {
    pub fn new(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        per_provider_timeout: Duration,
        chain: &str,
        exchange: &str,
    ) -> Self {
        Self {
            providers,
            per_provider_timeout,
            chain: chain.to_string(),
            exchange: exchange.to_string(),
        }
    }

    /// Never errors and never returns an empty batch: a total provider outage
    /// degrades to `params.limit` synthetic-tagged placeholders instead.
    pub async fn fetch(&self, params: &RankingParams) -> Vec<Pool> {
        let tasks = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let params = params.clone();
                (
                    provider.name().to_string(),
                    async move { provider.fetch(&params).await },
                )
            })
            .collect();

        let union = settle_all(tasks, self.per_provider_timeout).await;
        if union.is_empty() {
            warn!("all providers returned nothing, falling back to synthetic records");
            return synthetic::placeholder_batch(&self.chain, &self.exchange, params.limit);
        }
        union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticProvider;
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct FailingProvider;

    #[async_trait]
    impl MarketDataProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        async fn fetch(&self, _params: &RankingParams) -> anyhow::Result<Vec<Pool>> {
            Err(anyhow!("503 service unavailable"))
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl MarketDataProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }
        async fn fetch(&self, _params: &RankingParams) -> anyhow::Result<Vec<Pool>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn aggregator(providers: Vec<Arc<dyn MarketDataProvider>>) -> MarketDataAggregator {
        MarketDataAggregator::new(providers, Duration::from_secs(10), "ethereum", "uniswap-v2")
    }

    #[tokio::test(start_paused = true)]
    async fn failures_contribute_zero_without_aborting() {
        let agg = aggregator(vec![
            Arc::new(FailingProvider),
            Arc::new(StaticProvider::with_addresses(&["0xaaa", "0xbbb"])),
        ]);
        let batch = agg.fetch(&RankingParams::default()).await;
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|p| !p.synthetic));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_is_timed_out_independently() {
        let agg = aggregator(vec![
            Arc::new(HangingProvider),
            Arc::new(StaticProvider::with_addresses(&["0xaaa"])),
        ]);
        let batch = agg.fetch(&RankingParams::default()).await;
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn total_outage_falls_back_to_synthetic_batch() {
        let agg = aggregator(vec![Arc::new(FailingProvider), Arc::new(HangingProvider)]);
        let params = RankingParams {
            limit: 50,
            ..Default::default()
        };
        let batch = agg.fetch(&params).await;
        assert_eq!(batch.len(), 50);
        assert!(batch.iter().all(|p| p.synthetic));
    }
}
