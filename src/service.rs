use anyhow::Result;
use ethers::types::{Address, U256};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::app_context::AppContext;
use crate::executors::{ProxyWalletManager, TradeExecutor};
use crate::market_data::canonical;
use crate::types::events::ExecutionError;
use crate::types::pool::{RankedPools, RankingParams};
use crate::types::proxy::{ProxyStatus, ProxyWalletConfig, TradeRequest};

/// The facade collaborators (REST layer, chat bot, dashboard) talk to. Thin
/// glue over the same components the engine drives, so a ranking returned
/// here and a discovery cycle see identical data.
pub struct SniperService {
    context: AppContext,
    wallets: ProxyWalletManager,
    trades: Arc<TradeExecutor>,
}

impl SniperService {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
            wallets: ProxyWalletManager::new(context),
            trades: Arc::new(TradeExecutor::new(context)),
        }
    }

    /// Share the trade executor with the engine's action executor so both
    /// paths go through one fail-clean implementation.
    pub fn trade_executor(&self) -> Arc<TradeExecutor> {
        Arc::clone(&self.trades)
    }

    /// Provider union merged with recent creation events, deduplicated,
    /// stably sorted and paginated. Degrades to synthetic-tagged records on
    /// total provider outage; never errors and never returns an empty batch.
    pub async fn get_ranked_pools(&self, params: &RankingParams) -> RankedPools {
        let mut batch = self.context.aggregator.fetch(params).await;
        batch.extend(self.context.recent_pools.snapshot().await);
        canonical::rank_pools(batch, params)
    }

    pub async fn deploy_proxy_wallet(
        &self,
        user: Address,
        identity: &str,
        config: &ProxyWalletConfig,
    ) -> Result<Address, ExecutionError> {
        self.wallets.deploy(user, identity, config).await
    }

    pub async fn execute_trade(
        &self,
        user: Address,
        identity: &str,
        request: &TradeRequest,
    ) -> Result<Uuid, ExecutionError> {
        self.trades.execute_trade(user, identity, request).await
    }

    pub async fn update_approval(
        &self,
        user: Address,
        identity: &str,
        token: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        self.trades.update_approval(user, identity, token, amount).await
    }

    pub async fn get_proxy_status(
        &self,
        user: Address,
        identity: &str,
    ) -> Result<Option<ProxyStatus>> {
        let Some(wallet) = self
            .context
            .stores
            .wallets
            .find_wallet(user, identity)
            .await?
        else {
            return Ok(None);
        };
        let approvals = self.context.stores.approvals.approvals_for_user(user).await?;
        let trades = self.context.stores.trades.trades_for_user(user).await?;
        Ok(Some(ProxyStatus {
            wallet,
            approvals,
            trades,
        }))
    }
}
