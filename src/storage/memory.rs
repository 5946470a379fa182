use anyhow::Result;
use async_trait::async_trait;
use ethers::types::Address;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::storage::{
    AlertStore, ProxyApprovalStore, ProxyTradeStore, ProxyWalletStore, SniperConfigStore,
};
use crate::types::alert::Alert;
use crate::types::proxy::{ProxyApproval, ProxyTrade, ProxyWallet};
use crate::types::sniper_config::SniperConfig;

#[derive(Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<String, SniperConfig>>,
}

#[async_trait]
impl SniperConfigStore for InMemoryConfigStore {
    async fn active_configs(&self) -> Result<Vec<SniperConfig>> {
        Ok(self
            .configs
            .read()
            .await
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn upsert_config(&self, config: SniperConfig) -> Result<()> {
        self.configs
            .write()
            .await
            .insert(config.owner_identity.clone(), config);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryWalletStore {
    wallets: RwLock<HashMap<(Address, String), ProxyWallet>>,
}

#[async_trait]
impl ProxyWalletStore for InMemoryWalletStore {
    async fn find_wallet(&self, user: Address, identity: &str) -> Result<Option<ProxyWallet>> {
        Ok(self
            .wallets
            .read()
            .await
            .get(&(user, identity.to_string()))
            .cloned())
    }

    async fn insert_wallet(&self, wallet: ProxyWallet) -> Result<()> {
        self.wallets.write().await.insert(
            (wallet.user_address, wallet.owner_identity.clone()),
            wallet,
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTradeStore {
    trades: RwLock<Vec<ProxyTrade>>,
}

impl InMemoryTradeStore {
    pub async fn len(&self) -> usize {
        self.trades.read().await.len()
    }
}

#[async_trait]
impl ProxyTradeStore for InMemoryTradeStore {
    async fn insert_trade(&self, trade: ProxyTrade) -> Result<()> {
        self.trades.write().await.push(trade);
        Ok(())
    }

    async fn trades_for_user(&self, user: Address) -> Result<Vec<ProxyTrade>> {
        Ok(self
            .trades
            .read()
            .await
            .iter()
            .filter(|t| t.user_address == user)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryApprovalStore {
    approvals: RwLock<HashMap<(Address, Address), ProxyApproval>>,
}

#[async_trait]
impl ProxyApprovalStore for InMemoryApprovalStore {
    async fn upsert_approval(&self, approval: ProxyApproval) -> Result<()> {
        self.approvals
            .write()
            .await
            .insert((approval.user_address, approval.token_address), approval);
        Ok(())
    }

    async fn approvals_for_user(&self, user: Address) -> Result<Vec<ProxyApproval>> {
        Ok(self
            .approvals
            .read()
            .await
            .values()
            .filter(|a| a.user_address == user)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryAlertStore {
    alerts: RwLock<Vec<Alert>>,
}

impl InMemoryAlertStore {
    pub async fn snapshot(&self) -> Vec<Alert> {
        self.alerts.read().await.clone()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert_alert(&self, alert: Alert) -> Result<()> {
        self.alerts.write().await.push(alert);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ethers::types::U256;

    #[tokio::test]
    async fn approval_upsert_overwrites_by_user_and_token() {
        let store = InMemoryApprovalStore::default();
        let user = Address::repeat_byte(0x01);
        let token = Address::repeat_byte(0x02);
        for amount in [100u64, 250u64] {
            store
                .upsert_approval(ProxyApproval {
                    user_address: user,
                    token_address: token,
                    amount: U256::from(amount),
                    updated_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let approvals = store.approvals_for_user(user).await.unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].amount, U256::from(250u64));
    }

    #[tokio::test]
    async fn wallet_lookup_is_keyed_by_user_and_identity() {
        let store = InMemoryWalletStore::default();
        let user = Address::repeat_byte(0x01);
        let wallet = ProxyWallet {
            user_address: user,
            owner_identity: "tg:42".to_string(),
            proxy_address: Address::repeat_byte(0xaa),
            max_trade_amount: U256::from(1u64),
            max_slippage_pct: 1.0,
            daily_trade_limit: U256::from(10u64),
            is_active: true,
            deployed_at: Utc::now(),
        };
        store.insert_wallet(wallet).await.unwrap();

        assert!(store
            .find_wallet(user, "tg:42")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_wallet(user, "tg:43")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_wallet(Address::repeat_byte(0x02), "tg:42")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn inactive_configs_are_filtered_out() {
        let store = InMemoryConfigStore::default();
        store
            .upsert_config(SniperConfig {
                owner_identity: "a".to_string(),
                is_active: true,
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .upsert_config(SniperConfig {
                owner_identity: "b".to_string(),
                is_active: false,
                ..Default::default()
            })
            .await
            .unwrap();
        let active = store.active_configs().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].owner_identity, "a");
    }
}
