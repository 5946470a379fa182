//! In-crate fakes shared by the unit tests. No network, no chain.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use config::Map;
use ethers::types::{Address, Bytes, Log, TransactionRequest, H256, U256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::chain::{
    ChainError, ChainReader, ChainWriter, ContractCall, ErrorSink, LogSink, LogSubscriber,
    PreparedRequest, Simulation, SubscriptionHandle, TxReceipt,
};
use crate::config::app_context::AppContext;
use crate::config::settings::{
    AggregatorSettings, ChainSettings, CollectorSettings, EngineSettings, ExecutorSettings,
    LoggerSettings, Mode, NotifierSettings, Settings,
};
use crate::market_data::aggregator::MarketDataAggregator;
use crate::market_data::providers::MarketDataProvider;
use crate::notify::Notifier;
use crate::storage::memory::{
    InMemoryAlertStore, InMemoryApprovalStore, InMemoryConfigStore, InMemoryTradeStore,
    InMemoryWalletStore,
};
use crate::storage::Stores;
use crate::types::alert::Severity;
use crate::types::pool::{Pool, RankingParams, TokenInfo};
use crate::types::proxy::ProxyWallet;

pub(crate) fn settings() -> Settings {
    Settings {
        chain: ChainSettings {
            name: "ethereum".to_string(),
            exchange: "uniswap-v2".to_string(),
            chain_id: 1,
            rpc_http: "http://127.0.0.1:8545".to_string(),
            rpc_ws: "ws://127.0.0.1:8546".to_string(),
            factory_address: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f".to_string(),
            pair_created_event:
                "event PairCreated(address indexed token0, address indexed token1, address pair, uint256)"
                    .to_string(),
            pair_created_event_name: "PairCreated".to_string(),
            wrapped_native: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(),
            proxy_factory: "0x00000000000000000000000000000000000000f0".to_string(),
        },
        collector: CollectorSettings {
            discovery_interval_ms: 30_000,
        },
        aggregator: AggregatorSettings {
            provider_timeout_s: 10,
            providers: Map::new(),
        },
        executor: ExecutorSettings {
            private_key:
                "0x0000000000000000000000000000000000000000000000000000000000000001".to_string(),
            confirm_timeout_s: 1,
            confirm_poll_ms: 10,
        },
        engine: EngineSettings { mode: Mode::Live },
        notifier: NotifierSettings { webhook_url: None },
        logger: LoggerSettings {
            level: "info".to_string(),
        },
    }
}

/// ABI-encode an address as a single return word.
pub(crate) fn address_word(addr: Address) -> Bytes {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_bytes());
    Bytes::from(word.to_vec())
}

/// Programmable [`ChainWriter`]: each failure mode corresponds to one arm of
/// the write pipeline.
#[derive(Default)]
pub(crate) struct FakeWriter {
    fail_simulation: Option<String>,
    fail_send: Option<String>,
    revert_on_chain: bool,
    time_out: bool,
    result: Bytes,
    send_count: AtomicUsize,
    last_hash: StdMutex<H256>,
}

impl FakeWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_simulation(mut self, reason: &str) -> Self {
        self.fail_simulation = Some(reason.to_string());
        self
    }

    pub(crate) fn fail_send(mut self, reason: &str) -> Self {
        self.fail_send = Some(reason.to_string());
        self
    }

    pub(crate) fn revert_on_chain(mut self) -> Self {
        self.revert_on_chain = true;
        self
    }

    pub(crate) fn time_out_confirmation(mut self) -> Self {
        self.time_out = true;
        self
    }

    pub(crate) fn with_result(mut self, result: Bytes) -> Self {
        self.result = result;
        self
    }

    pub(crate) fn sends(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    pub(crate) fn last_tx_hash(&self) -> H256 {
        *self.last_hash.lock().unwrap()
    }
}

#[async_trait]
impl ChainWriter for FakeWriter {
    async fn simulate(&self, _call: &ContractCall) -> Result<Simulation, ChainError> {
        if let Some(reason) = &self.fail_simulation {
            return Err(ChainError::Reverted(reason.clone()));
        }
        Ok(Simulation {
            result: self.result.clone(),
            prepared: PreparedRequest {
                tx: TransactionRequest::default().into(),
            },
        })
    }

    async fn send(&self, _prepared: PreparedRequest) -> Result<H256, ChainError> {
        if let Some(reason) = &self.fail_send {
            return Err(ChainError::Transport(reason.clone()));
        }
        let n = self.send_count.fetch_add(1, Ordering::SeqCst);
        let hash = H256::from_low_u64_be(0xbeef_0000 + n as u64);
        *self.last_hash.lock().unwrap() = hash;
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError> {
        if self.time_out {
            return Err(ChainError::ConfirmationTimeout {
                tx_hash,
                waited_s: 0,
            });
        }
        Ok(TxReceipt {
            block_number: 1,
            status: !self.revert_on_chain,
        })
    }
}

pub(crate) struct FakeReader;

#[async_trait]
impl ChainReader for FakeReader {
    async fn call(&self, _call: &ContractCall) -> Result<Bytes, ChainError> {
        Ok(Bytes::default())
    }
}

pub(crate) struct NoopSubscriber;

#[async_trait]
impl LogSubscriber for NoopSubscriber {
    async fn subscribe(
        &self,
        _address: Address,
        _event_abi: &str,
        _event_name: &str,
        _on_logs: LogSink,
        _on_error: ErrorSink,
    ) -> Result<SubscriptionHandle, ChainError> {
        Ok(SubscriptionHandle::new(tokio::spawn(async {})))
    }
}

/// Subscriber that captures the sinks so a test can inject logs by hand.
pub(crate) struct CapturingSubscriber {
    pub(crate) sinks: Mutex<Option<(LogSink, ErrorSink)>>,
}

impl CapturingSubscriber {
    pub(crate) fn new() -> Self {
        Self {
            sinks: Mutex::new(None),
        }
    }

    pub(crate) async fn push_logs(&self, logs: Vec<Log>) {
        if let Some((on_logs, _)) = &*self.sinks.lock().await {
            on_logs(logs);
        }
    }
}

#[async_trait]
impl LogSubscriber for CapturingSubscriber {
    async fn subscribe(
        &self,
        _address: Address,
        _event_abi: &str,
        _event_name: &str,
        on_logs: LogSink,
        on_error: ErrorSink,
    ) -> Result<SubscriptionHandle, ChainError> {
        *self.sinks.lock().await = Some((on_logs, on_error));
        Ok(SubscriptionHandle::new(tokio::spawn(async {})))
    }
}

pub(crate) struct StaticProvider {
    pools: Vec<Pool>,
}

impl StaticProvider {
    pub(crate) fn with_addresses(addresses: &[&str]) -> Self {
        Self {
            pools: addresses
                .iter()
                .enumerate()
                .map(|(i, address)| Pool {
                    chain: "ethereum".to_string(),
                    exchange: "uniswap-v2".to_string(),
                    pair_address: format!("0xp{i}"),
                    base_token: TokenInfo {
                        address: address.to_string(),
                        ..Default::default()
                    },
                    liquidity_usd: 1_000.0,
                    created_at_unix: i as i64,
                    ..Default::default()
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, _params: &RankingParams) -> Result<Vec<Pool>> {
        Ok(self.pools.clone())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<(String, String, Severity)>>,
}

impl RecordingNotifier {
    pub(crate) async fn snapshot(&self) -> Vec<(String, String, Severity)> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        identity: &str,
        message: &str,
        severity: Severity,
        _metadata: &serde_json::Value,
    ) -> Result<()> {
        self.messages
            .lock()
            .await
            .push((identity.to_string(), message.to_string(), severity));
        Ok(())
    }
}

pub(crate) struct TestHarness {
    pub(crate) context: AppContext,
    pub(crate) writer: Arc<FakeWriter>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) alerts: Arc<InMemoryAlertStore>,
    pub(crate) trades: Arc<InMemoryTradeStore>,
}

impl TestHarness {
    pub(crate) async fn insert_wallet(&self, user: Address, identity: &str) {
        self.context
            .stores
            .wallets
            .insert_wallet(ProxyWallet {
                user_address: user,
                owner_identity: identity.to_string(),
                proxy_address: Address::repeat_byte(0xaa),
                max_trade_amount: U256::MAX,
                max_slippage_pct: 5.0,
                daily_trade_limit: U256::MAX,
                is_active: true,
                deployed_at: Utc::now(),
            })
            .await
            .unwrap();
    }
}

pub(crate) fn harness_with_writer(writer: FakeWriter) -> TestHarness {
    harness(writer, Arc::new(NoopSubscriber))
}

pub(crate) fn harness(writer: FakeWriter, subscriber: Arc<dyn LogSubscriber>) -> TestHarness {
    let writer = Arc::new(writer);
    let notifier = Arc::new(RecordingNotifier::default());
    let alerts = Arc::new(InMemoryAlertStore::default());
    let trades = Arc::new(InMemoryTradeStore::default());
    let stores = Stores {
        configs: Arc::new(InMemoryConfigStore::default()),
        wallets: Arc::new(InMemoryWalletStore::default()),
        trades: trades.clone(),
        approvals: Arc::new(InMemoryApprovalStore::default()),
        alerts: alerts.clone(),
    };
    let aggregator = Arc::new(MarketDataAggregator::new(
        vec![],
        Duration::from_secs(1),
        "ethereum",
        "uniswap-v2",
    ));
    let context = AppContext::assemble(
        settings(),
        Arc::new(FakeReader),
        writer.clone(),
        subscriber,
        aggregator,
        stores,
        notifier.clone(),
    );
    TestHarness {
        context,
        writer,
        notifier,
        alerts,
        trades,
    }
}

pub(crate) fn context() -> AppContext {
    harness_with_writer(FakeWriter::new()).context
}
