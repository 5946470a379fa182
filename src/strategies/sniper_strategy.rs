use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use ethers::types::{Address, U256};
use lru::LruCache;
use maplit::hashmap;
use std::fmt::{Debug, Formatter};
use std::num::NonZeroUsize;
use tracing::{debug, error, info, warn};

use crate::config::app_context::AppContext;
use crate::config::constants::{SEEN_POOLS_CAPACITY, TRADE_DEADLINE_S};
use crate::market_data::canonical;
use crate::strategies::matcher;
use crate::types::alert::Alert;
use crate::types::engine::{Strategy, StrategyStatus};
use crate::types::events::{Action, BotEvent};
use crate::types::pool::{Pool, RankingParams};
use crate::types::proxy::TradeRequest;
use crate::types::sniper_config::SniperConfig;

/// The decision core: every discovery tick it pulls the provider union,
/// merges in recent creation events, canonicalizes, and evaluates each pool
/// against every active user config. Matches become alert actions and, for
/// automated configs, trade actions.
pub struct SniperStrategy {
    context: AppContext,
    ranking: RankingParams,
    wrapped_native: Address,
    /// (owner, base token) pairs already acted on, so a pool that stays in
    /// the provider feeds does not re-trigger every cycle.
    seen: LruCache<String, ()>,
}

impl Debug for SniperStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SniperStrategy {{ ranking: {:?} }}", self.ranking)
    }
}

impl SniperStrategy {
    pub async fn new(context: &AppContext) -> Result<Self> {
        let wrapped_native = context.get_settings().await.chain.wrapped_native_address()?;
        Ok(Self {
            context: context.clone(),
            ranking: RankingParams::default(),
            wrapped_native,
            seen: LruCache::new(NonZeroUsize::new(SEEN_POOLS_CAPACITY).expect("nonzero")),
        })
    }

    async fn discovery_cycle(&mut self) -> Vec<Action> {
        let mut batch = self.context.aggregator.fetch(&self.ranking).await;
        // the event source and the poller converge on the same canonicalizer;
        // provider records come first so the richer record wins the dedup
        batch.extend(self.context.recent_pools.snapshot().await);
        let ranked = canonical::rank_pools(batch, &self.ranking);
        debug!(total = ranked.total, "discovery cycle canonicalized");
        self.evaluate(ranked.pools).await
    }

    pub(crate) async fn evaluate(&mut self, pools: Vec<Pool>) -> Vec<Action> {
        let configs = match self.context.stores.configs.active_configs().await {
            Ok(configs) => configs,
            Err(e) => {
                error!(error = %e, "failed to load active configs, skipping cycle");
                return vec![];
            }
        };

        let mut actions = Vec::new();
        for pool in pools {
            // placeholders keep the pipeline alive during provider outages
            // but must never trigger alerts or trades
            if pool.synthetic {
                continue;
            }
            for config in &configs {
                if !matcher::matches_criteria(&pool, config) {
                    continue;
                }
                let seen_key = format!("{}:{}", config.owner_identity, pool.dedup_key());
                if self.seen.contains(&seen_key) {
                    continue;
                }
                self.seen.put(seen_key, ());

                info!(
                    owner = %config.owner_identity,
                    token = %pool.base_token.address,
                    "pool matched criteria"
                );
                actions.push(Action::SendAlert(Alert::pool_match(&pool, config)));
                if config.auto_buy {
                    match self.trade_action(&pool, config) {
                        Some(action) => actions.push(action),
                        None => warn!(
                            owner = %config.owner_identity,
                            token = %pool.base_token.address,
                            "auto_buy set but trade parameters unusable, alert only"
                        ),
                    }
                }
            }
        }
        actions
    }

    fn trade_action(&self, pool: &Pool, config: &SniperConfig) -> Option<Action> {
        let user_address = config.user_address?;
        let token_out: Address = pool.base_token.address.parse().ok()?;
        if config.buy_size_native <= 0.0 {
            return None;
        }
        let amount_in = U256::from((config.buy_size_native * 1e18) as u128);
        Some(Action::ExecuteTrade {
            user_address,
            owner_identity: config.owner_identity.clone(),
            request: TradeRequest {
                token_in: self.wrapped_native,
                token_out,
                amount_in,
                // slippage is capped by the proxy contract itself
                min_amount_out: U256::zero(),
                deadline: Utc::now().timestamp() as u64 + TRADE_DEADLINE_S,
            },
            pool: pool.clone(),
        })
    }
}

#[async_trait]
impl Strategy<BotEvent, Action> for SniperStrategy {
    async fn sync_state(&mut self) -> Result<()> {
        // configs are re-read from the store every cycle; nothing to warm up
        Ok(())
    }

    async fn process_event(&mut self, event: BotEvent) -> Vec<Action> {
        match event {
            BotEvent::HeartBeat(..) => self.discovery_cycle().await,
            BotEvent::PoolCreated(pool) => self.evaluate(vec![pool]).await,
            BotEvent::ExecutionResult(..) => vec![],
        }
    }

    async fn get_status(&self) -> StrategyStatus {
        StrategyStatus::Running(hashmap! {
            "seen_pools".to_owned() => self.seen.len().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use crate::types::pool::TokenInfo;

    fn pool() -> Pool {
        Pool {
            chain: "ethereum".to_string(),
            exchange: "uniswap-v2".to_string(),
            base_token: TokenInfo {
                address: "0x00000000000000000000000000000000000aaaa1".to_string(),
                symbol: "FOO".to_string(),
                ..Default::default()
            },
            liquidity_usd: 50_000.0,
            market_cap_usd: 2_000_000.0,
            buy_tax_pct: 2.0,
            sell_tax_pct: 2.0,
            is_honeypot: false,
            ..Default::default()
        }
    }

    fn config(auto_buy: bool) -> SniperConfig {
        SniperConfig {
            owner_identity: "tg:1".to_string(),
            user_address: Some(Address::repeat_byte(0x01)),
            target_chains: vec!["ethereum".to_string()],
            target_dexs: vec!["uniswap-v2".to_string()],
            min_liquidity: 10_000.0,
            min_market_cap: 100_000.0,
            max_market_cap: 10_000_000.0,
            max_buy_tax: 10.0,
            max_sell_tax: 10.0,
            honeypot_check: true,
            auto_buy,
            buy_size_native: 0.5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn match_with_auto_buy_emits_alert_and_trade() {
        let context = test_support::context();
        context
            .stores
            .configs
            .upsert_config(config(true))
            .await
            .unwrap();
        let mut strategy = SniperStrategy::new(&context).await.unwrap();

        let actions = strategy.evaluate(vec![pool()]).await;
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::SendAlert(_)));
        match &actions[1] {
            Action::ExecuteTrade { request, .. } => {
                assert_eq!(request.amount_in, U256::from(500_000_000_000_000_000u128));
                assert_eq!(request.min_amount_out, U256::zero());
            }
            other => panic!("expected trade action, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn honeypot_pool_triggers_nothing() {
        let context = test_support::context();
        context
            .stores
            .configs
            .upsert_config(config(true))
            .await
            .unwrap();
        let mut strategy = SniperStrategy::new(&context).await.unwrap();

        let mut honeypot = pool();
        honeypot.is_honeypot = true;
        let actions = strategy.evaluate(vec![honeypot]).await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn repeated_pool_is_only_acted_on_once() {
        let context = test_support::context();
        context
            .stores
            .configs
            .upsert_config(config(false))
            .await
            .unwrap();
        let mut strategy = SniperStrategy::new(&context).await.unwrap();

        assert_eq!(strategy.evaluate(vec![pool()]).await.len(), 1);
        assert!(strategy.evaluate(vec![pool()]).await.is_empty());
    }

    #[tokio::test]
    async fn synthetic_pools_never_trigger() {
        let context = test_support::context();
        context
            .stores
            .configs
            .upsert_config(config(true))
            .await
            .unwrap();
        let mut strategy = SniperStrategy::new(&context).await.unwrap();

        let mut synthetic = pool();
        synthetic.synthetic = true;
        assert!(strategy.evaluate(vec![synthetic]).await.is_empty());
    }
}
