use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::app_context::AppContext;
use crate::executors::trade_executor::trade_call;
use crate::types::engine::Executor;
use crate::types::events::{Action, BotEvent, ExecutionError, ExecutionResult};

/// Paper-trading executor: the simulate phase runs against live chain state
/// so would-reverts are still caught, but nothing is broadcast and nothing
/// is persisted.
pub struct PaperTradeExecutor {
    context: AppContext,
}

impl PaperTradeExecutor {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
        }
    }
}

#[async_trait]
impl Executor<Action, BotEvent> for PaperTradeExecutor {
    async fn execute(&self, action: Action) -> Result<Option<BotEvent>> {
        let Action::ExecuteTrade {
            user_address,
            owner_identity,
            request,
            pool,
        } = action
        else {
            return Ok(None);
        };

        let wallet = match self
            .context
            .stores
            .wallets
            .find_wallet(user_address, &owner_identity)
            .await
        {
            Ok(Some(wallet)) => wallet,
            Ok(None) => {
                warn!(owner = %owner_identity, "paper trade skipped, no proxy wallet");
                let error = ExecutionError::NoProxyWallet {
                    user: user_address,
                    identity: owner_identity.clone(),
                };
                return Ok(Some(BotEvent::ExecutionResult(
                    ExecutionResult::TradeRejected {
                        owner_identity,
                        error,
                    },
                )));
            }
            Err(e) => {
                return Ok(Some(BotEvent::ExecutionResult(
                    ExecutionResult::TradeRejected {
                        owner_identity,
                        error: ExecutionError::Storage(e.to_string()),
                    },
                )))
            }
        };

        let call = match trade_call(wallet.proxy_address, &request) {
            Ok(call) => call,
            Err(e) => {
                return Ok(Some(BotEvent::ExecutionResult(
                    ExecutionResult::TradeRejected {
                        owner_identity,
                        error: ExecutionError::BadChainData(e.to_string()),
                    },
                )))
            }
        };

        let result = match self.context.writer.simulate(&call).await {
            Ok(_) => {
                info!(
                    owner = %owner_identity,
                    token = %pool.base_token.address,
                    amount_in = %request.amount_in,
                    "paper trade would execute"
                );
                ExecutionResult::TradeSimulated { owner_identity }
            }
            Err(e) => {
                info!(owner = %owner_identity, error = %e, "paper trade would revert");
                ExecutionResult::TradeRejected {
                    owner_identity,
                    error: ExecutionError::SimulationFailed(e.to_string()),
                }
            }
        };
        Ok(Some(BotEvent::ExecutionResult(result)))
    }
}
