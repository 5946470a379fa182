use ethers::types::{Address, H256};
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::types::alert::Alert;
use crate::types::pool::Pool;
use crate::types::proxy::TradeRequest;

pub type TickSizeMs = u64;

/// Convenience enum containing all the events that can be emitted by
/// collectors or fed back by executors.
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// Fixed-interval discovery tick.
    HeartBeat(TickSizeMs, Instant),
    /// A pool-creation log already normalized into the canonical shape
    /// (on-chain fields only; market-data fields are zero until a provider
    /// reports them).
    PoolCreated(Pool),
    /// Terminal outcome of an executed action, fed back into the event loop.
    ExecutionResult(ExecutionResult),
}

/// Actions emitted by strategies and consumed by executors.
#[derive(Debug, Clone)]
pub enum Action {
    ExecuteTrade {
        user_address: Address,
        owner_identity: String,
        request: TradeRequest,
        pool: Pool,
    },
    SendAlert(Alert),
}

/// Errors on the trade path. These always escalate to the caller, since silent
/// trade failure is unacceptable, and carry enough detail (reason, tx hash
/// when one exists) to decide whether a retry is safe.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("no proxy wallet deployed for user {user:?} with identity {identity}")]
    NoProxyWallet { user: Address, identity: String },
    /// Terminal before anything was broadcast; zero funds at risk.
    #[error("simulation failed: {0}")]
    SimulationFailed(String),
    /// The signed transaction never reached the network.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    /// The transaction was broadcast and definitively failed; gas may be
    /// spent. Distinguished from [`ExecutionError::SimulationFailed`] because
    /// the chain state may have moved.
    #[error("confirmation failed for tx {tx_hash:?}: {reason}")]
    ConfirmationFailed { tx_hash: H256, reason: String },
    /// Confirmation wait expired with no receipt either way. Not a failure:
    /// the transaction may still land. Callers must re-query before retrying
    /// to avoid double-submission.
    #[error("outcome unknown for tx {tx_hash:?}: {reason}")]
    OutcomeUnknown { tx_hash: H256, reason: String },
    #[error("malformed chain data: {0}")]
    BadChainData(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone)]
pub enum ExecutionResult {
    TradeExecuted {
        trade_id: Uuid,
        owner_identity: String,
    },
    TradeRejected {
        owner_identity: String,
        error: ExecutionError,
    },
    /// Paper-trading outcome: simulated but never broadcast.
    TradeSimulated {
        owner_identity: String,
    },
}
