use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Log, H256, U256};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

pub mod abi;
pub mod erc20;
pub mod evm;
pub mod write_pipeline;

/// Typed chain error. Read errors on the discovery path are logged and the
/// cycle continues; on the trade path they are mapped into
/// [`crate::types::events::ExecutionError`] and escalate.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),
    /// A dry-run came back as would-revert. The reason is preserved verbatim,
    /// including the revert message when the node surfaces one.
    #[error("simulation reverted: {0}")]
    Reverted(String),
    /// The confirmation wait expired and a final re-query still found no
    /// receipt. The transaction may or may not land later.
    #[error("no receipt for tx {tx_hash:?} after {waited_s}s")]
    ConfirmationTimeout { tx_hash: H256, waited_s: u64 },
    #[error("malformed return data: {0}")]
    BadReturnData(String),
    #[error("invalid abi: {0}")]
    Abi(String),
}

/// A contract call to simulate, read, or submit.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl ContractCall {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            value: U256::zero(),
        }
    }
}

/// A transaction that went through the dry-run and is ready to broadcast:
/// gas, nonce and fees are filled in.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub tx: TypedTransaction,
}

/// Outcome of a dry-run: the call's deterministic return value plus the
/// request prepared for broadcast.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub result: Bytes,
    pub prepared: PreparedRequest,
}

#[derive(Debug, Clone, Copy)]
pub struct TxReceipt {
    pub block_number: u64,
    /// `true` iff the transaction executed successfully on-chain.
    pub status: bool,
}

/// Read-only contract access (getters).
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn call(&self, call: &ContractCall) -> Result<Bytes, ChainError>;
}

/// The chain-write seam every state-changing call goes through, always in
/// the same three phases: simulate, send, confirm.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Dry-run against current chain state. Surfaces would-revert conditions
    /// before any gas is spent and carries the call's return value.
    async fn simulate(&self, call: &ContractCall) -> Result<Simulation, ChainError>;

    /// Broadcast the signed transaction; returns as soon as the node accepts
    /// it. There is no cancelling past this point.
    async fn send(&self, prepared: PreparedRequest) -> Result<H256, ChainError>;

    /// Block until the transaction is mined. A timeout is reported as
    /// [`ChainError::ConfirmationTimeout`] after one final re-query, never as
    /// a definitive failure.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError>;
}

pub type LogSink = Arc<dyn Fn(Vec<Log>) + Send + Sync>;
pub type ErrorSink = Arc<dyn Fn(ChainError) + Send + Sync>;

/// Owned handle to a live log subscription. Dropping it leaves the
/// subscription running (detached); call [`SubscriptionHandle::unsubscribe`]
/// to tear it down. An explicit handle instead of a process-wide "currently
/// listening" flag, so several pipelines can coexist.
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

/// Subscription primitive the Chain Event Source consumes. Delivery is
/// at-least-once while subscribed, in block order only. Node errors are
/// handed to `on_error`, never thrown into the caller's stack; the caller
/// decides whether to resubscribe.
#[async_trait]
pub trait LogSubscriber: Send + Sync {
    async fn subscribe(
        &self,
        address: Address,
        event_abi: &str,
        event_name: &str,
        on_logs: LogSink,
        on_error: ErrorSink,
    ) -> Result<SubscriptionHandle, ChainError>;
}
