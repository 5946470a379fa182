use ethers::types::{Bytes, H256};
use tracing::{debug, warn};

use crate::chain::{ChainError, ChainWriter, ContractCall, Simulation};

/// The simulate/send/confirm progression as an explicit tagged union
/// instead of nested error handling, so the fail-clean guarantee is visible
/// at the type level: everything before `Submitted` dies without a trace on
/// chain, everything after carries the tx hash.
#[derive(Debug)]
enum WritePhase {
    Requested,
    Simulated(Simulation),
    Submitted { tx_hash: H256, result: Bytes },
}

/// Terminal outcome of one on-chain write attempt.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Mined and succeeded. `result` is the return value obtained from the
    /// dry-run, which already carries it; no log parsing needed.
    Executed {
        tx_hash: H256,
        block_number: u64,
        result: Bytes,
    },
    /// Would-revert caught before broadcast; zero funds at risk.
    SimulationFailed { reason: String },
    /// The node rejected the broadcast; nothing reached the network.
    SendFailed { reason: String },
    /// Broadcast succeeded but the transaction definitively failed
    /// (reverted on-chain, or confirmation errored). Gas may be spent.
    Failed { tx_hash: H256, reason: String },
    /// Confirmation wait expired with no receipt either way. Callers must
    /// re-query before retrying to avoid double-submission.
    Unknown { tx_hash: H256, reason: String },
}

/// Drive one contract write to a terminal outcome. No transition ever leaves
/// a terminal state; retries are a fresh call.
pub async fn run_write(writer: &dyn ChainWriter, call: &ContractCall) -> WriteOutcome {
    let mut phase = WritePhase::Requested;
    loop {
        phase = match phase {
            WritePhase::Requested => match writer.simulate(call).await {
                Ok(simulation) => {
                    debug!(to = ?call.to, "simulation ok");
                    WritePhase::Simulated(simulation)
                }
                Err(e) => {
                    return WriteOutcome::SimulationFailed {
                        reason: e.to_string(),
                    }
                }
            },
            WritePhase::Simulated(simulation) => {
                let result = simulation.result.clone();
                match writer.send(simulation.prepared).await {
                    Ok(tx_hash) => {
                        debug!(?tx_hash, "transaction submitted");
                        WritePhase::Submitted { tx_hash, result }
                    }
                    Err(e) => {
                        return WriteOutcome::SendFailed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            WritePhase::Submitted { tx_hash, result } => {
                return match writer.wait_for_receipt(tx_hash).await {
                    Ok(receipt) if receipt.status => WriteOutcome::Executed {
                        tx_hash,
                        block_number: receipt.block_number,
                        result,
                    },
                    Ok(_) => WriteOutcome::Failed {
                        tx_hash,
                        reason: "transaction reverted on-chain".to_string(),
                    },
                    Err(timeout @ ChainError::ConfirmationTimeout { .. }) => {
                        warn!(?tx_hash, "confirmation timed out, outcome unknown");
                        WriteOutcome::Unknown {
                            tx_hash,
                            reason: timeout.to_string(),
                        }
                    }
                    Err(e) => WriteOutcome::Failed {
                        tx_hash,
                        reason: e.to_string(),
                    },
                };
            }
        };
    }
}
