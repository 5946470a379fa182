use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use ethers::abi::Token;
use ethers::types::{Address, U256};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::chain::write_pipeline::{run_write, WriteOutcome};
use crate::chain::{abi, ChainError, ContractCall};
use crate::config::app_context::AppContext;
use crate::executors::alert_executor::AlertEmitter;
use crate::types::alert::{Alert, AlertType, Severity};
use crate::types::engine::Executor;
use crate::types::events::{Action, BotEvent, ExecutionError, ExecutionResult};
use crate::types::proxy::{ProxyApproval, ProxyTrade, ProxyWallet, TradeRequest, TradeStatus};

const TRADE_FN: &str = "function executeTrade(address tokenIn, address tokenOut, uint256 amountIn, uint256 minAmountOut, uint256 deadline) returns (uint256 amountOut)";
const APPROVAL_FN: &str = "function updateApproval(address token, uint256 amount)";

pub(crate) fn trade_call(
    proxy: Address,
    request: &TradeRequest,
) -> Result<ContractCall, ChainError> {
    let data = abi::encode_function_call(
        TRADE_FN,
        &[
            Token::Address(request.token_in),
            Token::Address(request.token_out),
            Token::Uint(request.amount_in),
            Token::Uint(request.min_amount_out),
            Token::Uint(U256::from(request.deadline)),
        ],
    )?;
    Ok(ContractCall::new(proxy, data))
}

/// Runs trades and approvals through the proxy wallet, simulate, send,
/// confirm, persisting terminal outcomes only. Failures before broadcast
/// leave no trace at all, so retries start from a clean slate. Concurrent
/// trades racing a shared spending cap are not locked here: the proxy's own
/// limit accounting reverts the loser during simulation, which costs nothing.
pub struct TradeExecutor {
    context: AppContext,
    emitter: AlertEmitter,
}

impl TradeExecutor {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
            emitter: AlertEmitter::new(context),
        }
    }

    async fn require_wallet(
        &self,
        user: Address,
        identity: &str,
    ) -> Result<ProxyWallet, ExecutionError> {
        let wallet = self
            .context
            .stores
            .wallets
            .find_wallet(user, identity)
            .await
            .map_err(|e| ExecutionError::Storage(e.to_string()))?;
        match wallet {
            Some(wallet) if wallet.is_active => Ok(wallet),
            // never auto-provisioned: a missing or deactivated proxy is a
            // hard failure the caller must resolve through deploy
            _ => Err(ExecutionError::NoProxyWallet {
                user,
                identity: identity.to_string(),
            }),
        }
    }

    pub async fn execute_trade(
        &self,
        user: Address,
        identity: &str,
        request: &TradeRequest,
    ) -> Result<Uuid, ExecutionError> {
        let wallet = self.require_wallet(user, identity).await?;
        // generated before submission so retries can be correlated
        let trade_id = Uuid::new_v4();
        let call = trade_call(wallet.proxy_address, request)
            .map_err(|e| ExecutionError::BadChainData(e.to_string()))?;

        match run_write(self.context.writer.as_ref(), &call).await {
            WriteOutcome::Executed { tx_hash, .. } => {
                let trade = ProxyTrade {
                    trade_id,
                    user_address: user,
                    token_in: request.token_in,
                    token_out: request.token_out,
                    amount_in: request.amount_in,
                    min_amount_out: request.min_amount_out,
                    deadline: request.deadline,
                    status: TradeStatus::Executed,
                    tx_hash,
                    executed_at: Utc::now(),
                };
                if let Err(e) = self.context.stores.trades.insert_trade(trade).await {
                    // the trade is on-chain either way; record loss is an
                    // operator problem, not a trade failure
                    error!(%trade_id, ?tx_hash, error = %e, "failed to persist executed trade");
                }
                info!(%trade_id, ?tx_hash, "trade executed");
                self.emitter
                    .emit(Alert::trade_terminal(
                        AlertType::TradeExecuted,
                        Severity::Info,
                        identity,
                        format!("Trade {trade_id} executed in tx {tx_hash:?}"),
                        json!({ "trade_id": trade_id, "tx_hash": tx_hash, "request": request }),
                    ))
                    .await;
                Ok(trade_id)
            }
            WriteOutcome::SimulationFailed { reason } => {
                // terminal from REQUESTED: zero funds at risk, nothing persisted
                self.emitter
                    .emit(Alert::trade_terminal(
                        AlertType::TradeFailed,
                        Severity::Warning,
                        identity,
                        format!("Trade {trade_id} rejected in simulation: {reason}"),
                        json!({ "trade_id": trade_id, "reason": reason, "request": request }),
                    ))
                    .await;
                Err(ExecutionError::SimulationFailed(reason))
            }
            WriteOutcome::SendFailed { reason } => {
                self.emitter
                    .emit(Alert::trade_terminal(
                        AlertType::TradeFailed,
                        Severity::Warning,
                        identity,
                        format!("Trade {trade_id} not accepted by node: {reason}"),
                        json!({ "trade_id": trade_id, "reason": reason, "request": request }),
                    ))
                    .await;
                Err(ExecutionError::SubmissionFailed(reason))
            }
            WriteOutcome::Failed { tx_hash, reason } => {
                // terminal from SUBMITTED: gas may be spent, so the attempt
                // is recorded with the submitted hash, never discarded
                let trade = ProxyTrade {
                    trade_id,
                    user_address: user,
                    token_in: request.token_in,
                    token_out: request.token_out,
                    amount_in: request.amount_in,
                    min_amount_out: request.min_amount_out,
                    deadline: request.deadline,
                    status: TradeStatus::Failed,
                    tx_hash,
                    executed_at: Utc::now(),
                };
                if let Err(e) = self.context.stores.trades.insert_trade(trade).await {
                    error!(%trade_id, ?tx_hash, error = %e, "failed to persist failed trade");
                }
                self.emitter
                    .emit(Alert::trade_terminal(
                        AlertType::TradeFailed,
                        Severity::Critical,
                        identity,
                        format!("Trade {trade_id} failed after submission in tx {tx_hash:?}: {reason}"),
                        json!({ "trade_id": trade_id, "tx_hash": tx_hash, "reason": reason }),
                    ))
                    .await;
                Err(ExecutionError::ConfirmationFailed { tx_hash, reason })
            }
            WriteOutcome::Unknown { tx_hash, reason } => {
                // not a terminal state: the tx may still land, so no record
                // and no terminal alert; the caller must re-query before any
                // retry to avoid double-submission
                warn!(%trade_id, ?tx_hash, %reason, "trade outcome unknown");
                Err(ExecutionError::OutcomeUnknown { tx_hash, reason })
            }
        }
    }

    /// Same three phases as a trade; the terminal outcome is an idempotent
    /// upsert keyed by (user, token) instead of an append.
    pub async fn update_approval(
        &self,
        user: Address,
        identity: &str,
        token: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let wallet = self.require_wallet(user, identity).await?;
        let data = abi::encode_function_call(
            APPROVAL_FN,
            &[Token::Address(token), Token::Uint(amount)],
        )
        .map_err(|e| ExecutionError::BadChainData(e.to_string()))?;
        let call = ContractCall::new(wallet.proxy_address, data);

        match run_write(self.context.writer.as_ref(), &call).await {
            WriteOutcome::Executed { tx_hash, .. } => {
                let approval = ProxyApproval {
                    user_address: user,
                    token_address: token,
                    amount,
                    updated_at: Utc::now(),
                };
                self.context
                    .stores
                    .approvals
                    .upsert_approval(approval)
                    .await
                    .map_err(|e| ExecutionError::Storage(e.to_string()))?;
                info!(?user, ?token, %amount, ?tx_hash, "approval updated");
                Ok(())
            }
            WriteOutcome::SimulationFailed { reason } => {
                Err(ExecutionError::SimulationFailed(reason))
            }
            WriteOutcome::SendFailed { reason } => Err(ExecutionError::SubmissionFailed(reason)),
            WriteOutcome::Failed { tx_hash, reason } => {
                Err(ExecutionError::ConfirmationFailed { tx_hash, reason })
            }
            WriteOutcome::Unknown { tx_hash, reason } => {
                Err(ExecutionError::OutcomeUnknown { tx_hash, reason })
            }
        }
    }
}

/// Engine adapter for live mode: turns trade actions into executed trades
/// and feeds terminal results back as events.
pub struct TradeActionExecutor {
    trades: Arc<TradeExecutor>,
}

impl TradeActionExecutor {
    pub fn new(trades: Arc<TradeExecutor>) -> Self {
        Self { trades }
    }
}

#[async_trait]
impl Executor<Action, BotEvent> for TradeActionExecutor {
    async fn execute(&self, action: Action) -> Result<Option<BotEvent>> {
        match action {
            Action::ExecuteTrade {
                user_address,
                owner_identity,
                request,
                pool: _,
            } => {
                let result = match self
                    .trades
                    .execute_trade(user_address, &owner_identity, &request)
                    .await
                {
                    Ok(trade_id) => ExecutionResult::TradeExecuted {
                        trade_id,
                        owner_identity,
                    },
                    Err(error) => ExecutionResult::TradeRejected {
                        owner_identity,
                        error,
                    },
                };
                Ok(Some(BotEvent::ExecutionResult(result)))
            }
            Action::SendAlert(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness_with_writer, FakeWriter, TestHarness};
    use crate::types::alert::AlertType;

    fn request() -> TradeRequest {
        TradeRequest {
            token_in: Address::repeat_byte(0xee),
            token_out: Address::repeat_byte(0x01),
            amount_in: U256::from(10u64).pow(U256::from(17u64)),
            min_amount_out: U256::zero(),
            deadline: 1_900_000_000,
        }
    }

    async fn with_wallet(harness: &TestHarness) -> Address {
        let user = Address::repeat_byte(0x01);
        harness.insert_wallet(user, "tg:1").await;
        user
    }

    #[tokio::test]
    async fn missing_wallet_is_a_hard_failure() {
        let harness = harness_with_writer(FakeWriter::new());
        let executor = TradeExecutor::new(&harness.context);
        let err = executor
            .execute_trade(Address::repeat_byte(0x09), "tg:9", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NoProxyWallet { .. }));
        assert_eq!(harness.trades.len().await, 0);
        assert_eq!(harness.writer.sends(), 0);
    }

    #[tokio::test]
    async fn simulate_failure_persists_nothing() {
        let harness =
            harness_with_writer(FakeWriter::new().fail_simulation("execution reverted: TAXED"));
        let user = with_wallet(&harness).await;
        let executor = TradeExecutor::new(&harness.context);

        let err = executor
            .execute_trade(user, "tg:1", &request())
            .await
            .unwrap_err();
        match err {
            ExecutionError::SimulationFailed(reason) => assert!(reason.contains("TAXED")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(harness.trades.len().await, 0);
        // terminal state still notifies the owner
        let alerts = harness.alerts.snapshot().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::TradeFailed);
    }

    #[tokio::test]
    async fn confirm_failure_records_failed_trade_with_hash() {
        let harness = harness_with_writer(FakeWriter::new().revert_on_chain());
        let user = with_wallet(&harness).await;
        let executor = TradeExecutor::new(&harness.context);

        let err = executor
            .execute_trade(user, "tg:1", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ConfirmationFailed { .. }));

        let trades = harness.context.stores.trades.trades_for_user(user).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].status, TradeStatus::Failed);
        assert_eq!(trades[0].tx_hash, harness.writer.last_tx_hash());
    }

    #[tokio::test]
    async fn confirmation_timeout_is_unknown_and_unpersisted() {
        let harness = harness_with_writer(FakeWriter::new().time_out_confirmation());
        let user = with_wallet(&harness).await;
        let executor = TradeExecutor::new(&harness.context);

        let err = executor
            .execute_trade(user, "tg:1", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::OutcomeUnknown { .. }));
        assert_eq!(harness.trades.len().await, 0);
    }

    #[tokio::test]
    async fn executed_trade_is_recorded_and_notified() {
        let harness = harness_with_writer(FakeWriter::new());
        let user = with_wallet(&harness).await;
        let executor = TradeExecutor::new(&harness.context);

        let trade_id = executor.execute_trade(user, "tg:1", &request()).await.unwrap();

        let trades = harness.context.stores.trades.trades_for_user(user).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].trade_id, trade_id);
        assert_eq!(trades[0].status, TradeStatus::Executed);

        let alerts = harness.alerts.snapshot().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::TradeExecuted);
        assert_eq!(alerts[0].owner_identity, "tg:1");
    }

    #[tokio::test]
    async fn approval_is_upserted_not_appended() {
        let harness = harness_with_writer(FakeWriter::new());
        let user = with_wallet(&harness).await;
        let executor = TradeExecutor::new(&harness.context);
        let token = Address::repeat_byte(0x02);

        executor
            .update_approval(user, "tg:1", token, U256::from(100u64))
            .await
            .unwrap();
        executor
            .update_approval(user, "tg:1", token, U256::from(900u64))
            .await
            .unwrap();

        let approvals = harness
            .context
            .stores
            .approvals
            .approvals_for_user(user)
            .await
            .unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].amount, U256::from(900u64));
    }

    #[tokio::test]
    async fn failed_approval_leaves_no_allowance_row() {
        let harness =
            harness_with_writer(FakeWriter::new().fail_simulation("execution reverted"));
        let user = with_wallet(&harness).await;
        let executor = TradeExecutor::new(&harness.context);

        let err = executor
            .update_approval(user, "tg:1", Address::repeat_byte(0x02), U256::one())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::SimulationFailed(_)));
        let approvals = harness
            .context
            .stores
            .approvals
            .approvals_for_user(user)
            .await
            .unwrap();
        assert!(approvals.is_empty());
    }
}
