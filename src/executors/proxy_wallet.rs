use chrono::Utc;
use ethers::abi::Token;
use ethers::types::{Address, U256};
use tracing::{error, info};

use crate::chain::write_pipeline::{run_write, WriteOutcome};
use crate::chain::{abi, ContractCall};
use crate::config::app_context::AppContext;
use crate::types::events::ExecutionError;
use crate::types::proxy::{ProxyWallet, ProxyWalletConfig};

const DEPLOY_PROXY_FN: &str = "function deployProxy(address user, uint256 maxTradeAmount, uint256 maxSlippageBps, uint256 dailyTradeLimit) returns (address proxy)";

/// Deploys and resolves per-user proxy contracts. Idempotent at the identity
/// level: the store is consulted before any on-chain write, so a second call
/// for the same (user, identity) returns the recorded address untouched.
pub struct ProxyWalletManager {
    context: AppContext,
}

impl ProxyWalletManager {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn lookup(
        &self,
        user: Address,
        identity: &str,
    ) -> Result<Option<ProxyWallet>, ExecutionError> {
        self.context
            .stores
            .wallets
            .find_wallet(user, identity)
            .await
            .map_err(|e| ExecutionError::Storage(e.to_string()))
    }

    pub async fn deploy(
        &self,
        user: Address,
        identity: &str,
        config: &ProxyWalletConfig,
    ) -> Result<Address, ExecutionError> {
        if let Some(existing) = self.lookup(user, identity).await? {
            info!(
                ?user,
                identity,
                proxy = ?existing.proxy_address,
                "proxy wallet already deployed, returning existing"
            );
            return Ok(existing.proxy_address);
        }

        let factory = {
            let settings = self.context.get_settings().await;
            settings
                .chain
                .proxy_factory_address()
                .map_err(|e| ExecutionError::BadChainData(e.to_string()))?
        };
        let slippage_bps = U256::from((config.max_slippage_pct * 100.0).round().max(0.0) as u64);
        let data = abi::encode_function_call(
            DEPLOY_PROXY_FN,
            &[
                Token::Address(user),
                Token::Uint(config.max_trade_amount),
                Token::Uint(slippage_bps),
                Token::Uint(config.daily_trade_limit),
            ],
        )
        .map_err(|e| ExecutionError::BadChainData(e.to_string()))?;
        let call = ContractCall::new(factory, data);

        match run_write(self.context.writer.as_ref(), &call).await {
            WriteOutcome::Executed {
                tx_hash, result, ..
            } => {
                // the dry-run already carries the factory's return value, so
                // the deployed address comes from there, not from log parsing
                let proxy = abi::decode_address_return(&result)
                    .map_err(|e| ExecutionError::BadChainData(e.to_string()))?;
                let wallet = ProxyWallet {
                    user_address: user,
                    owner_identity: identity.to_string(),
                    proxy_address: proxy,
                    max_trade_amount: config.max_trade_amount,
                    max_slippage_pct: config.max_slippage_pct,
                    daily_trade_limit: config.daily_trade_limit,
                    is_active: true,
                    deployed_at: Utc::now(),
                };
                if let Err(e) = self.context.stores.wallets.insert_wallet(wallet).await {
                    // deployed but not recorded: surface loudly, the operator
                    // must reconcile before this identity deploys again
                    error!(?user, identity, ?proxy, error = %e, "failed to persist deployed proxy");
                    return Err(ExecutionError::Storage(e.to_string()));
                }
                info!(?user, identity, ?proxy, ?tx_hash, "proxy wallet deployed");
                Ok(proxy)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{address_word, harness_with_writer, FakeWriter};

    fn wallet_config() -> ProxyWalletConfig {
        ProxyWalletConfig {
            max_trade_amount: U256::from(10u64).pow(U256::from(18u64)),
            max_slippage_pct: 2.5,
            daily_trade_limit: U256::from(5u64) * U256::from(10u64).pow(U256::from(18u64)),
        }
    }

    #[tokio::test]
    async fn deploy_is_idempotent_per_identity() {
        let proxy = Address::repeat_byte(0xcd);
        let harness =
            harness_with_writer(FakeWriter::new().with_result(address_word(proxy)));
        let manager = ProxyWalletManager::new(&harness.context);
        let user = Address::repeat_byte(0x01);

        let first = manager.deploy(user, "tg:1", &wallet_config()).await.unwrap();
        let second = manager.deploy(user, "tg:1", &wallet_config()).await.unwrap();

        assert_eq!(first, proxy);
        assert_eq!(first, second);
        // exactly one on-chain write for the identity
        assert_eq!(harness.writer.sends(), 1);
    }

    #[tokio::test]
    async fn distinct_identities_get_distinct_deploys() {
        let harness = harness_with_writer(
            FakeWriter::new().with_result(address_word(Address::repeat_byte(0xcd))),
        );
        let manager = ProxyWalletManager::new(&harness.context);
        let user = Address::repeat_byte(0x01);

        manager.deploy(user, "tg:1", &wallet_config()).await.unwrap();
        manager.deploy(user, "tg:2", &wallet_config()).await.unwrap();
        assert_eq!(harness.writer.sends(), 2);
    }

    #[tokio::test]
    async fn simulate_failure_aborts_before_spending() {
        let harness =
            harness_with_writer(FakeWriter::new().fail_simulation("execution reverted"));
        let manager = ProxyWalletManager::new(&harness.context);
        let user = Address::repeat_byte(0x01);

        let err = manager
            .deploy(user, "tg:1", &wallet_config())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::SimulationFailed(_)));
        assert_eq!(harness.writer.sends(), 0);
        assert!(manager.lookup(user, "tg:1").await.unwrap().is_none());
    }
}
