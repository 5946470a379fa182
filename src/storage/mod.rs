use anyhow::Result;
use async_trait::async_trait;
use ethers::types::Address;
use std::sync::Arc;

use crate::types::alert::Alert;
use crate::types::proxy::{ProxyApproval, ProxyTrade, ProxyWallet};
use crate::types::sniper_config::SniperConfig;

pub mod memory;

/// The relational layer is an excluded collaborator; these traits are its
/// seam. The in-memory implementation in [`memory`] backs the default wiring
/// and the tests.

#[async_trait]
pub trait SniperConfigStore: Send + Sync {
    /// All configs with `is_active` set; evaluated every discovery cycle.
    async fn active_configs(&self) -> Result<Vec<SniperConfig>>;

    /// Keyed by owner identity.
    async fn upsert_config(&self, config: SniperConfig) -> Result<()>;
}

#[async_trait]
pub trait ProxyWalletStore: Send + Sync {
    async fn find_wallet(&self, user: Address, identity: &str) -> Result<Option<ProxyWallet>>;

    async fn insert_wallet(&self, wallet: ProxyWallet) -> Result<()>;
}

#[async_trait]
pub trait ProxyTradeStore: Send + Sync {
    /// Insert a terminal trade record. Never called mid-flight.
    async fn insert_trade(&self, trade: ProxyTrade) -> Result<()>;

    async fn trades_for_user(&self, user: Address) -> Result<Vec<ProxyTrade>>;
}

#[async_trait]
pub trait ProxyApprovalStore: Send + Sync {
    /// Upsert keyed by (user_address, token_address).
    async fn upsert_approval(&self, approval: ProxyApproval) -> Result<()>;

    async fn approvals_for_user(&self, user: Address) -> Result<Vec<ProxyApproval>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_alert(&self, alert: Alert) -> Result<()>;
}

/// Bundle of store handles passed around the pipeline.
#[derive(Clone)]
pub struct Stores {
    pub configs: Arc<dyn SniperConfigStore>,
    pub wallets: Arc<dyn ProxyWalletStore>,
    pub trades: Arc<dyn ProxyTradeStore>,
    pub approvals: Arc<dyn ProxyApprovalStore>,
    pub alerts: Arc<dyn AlertStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            configs: Arc::new(memory::InMemoryConfigStore::default()),
            wallets: Arc::new(memory::InMemoryWalletStore::default()),
            trades: Arc::new(memory::InMemoryTradeStore::default()),
            approvals: Arc::new(memory::InMemoryApprovalStore::default()),
            alerts: Arc::new(memory::InMemoryAlertStore::default()),
        }
    }
}
