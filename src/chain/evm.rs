use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider, Ws};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Filter, TransactionReceipt, TransactionRequest, H256, U64};
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chain::{
    abi, ChainError, ChainReader, ChainWriter, ContractCall, ErrorSink, LogSink, LogSubscriber,
    PreparedRequest, Simulation, SubscriptionHandle, TxReceipt,
};

/// Shared, stateless EVM client: one HTTP provider for reads/writes and a
/// websocket endpoint for log subscriptions. Safe to use from many
/// concurrent callers.
pub struct EvmClient {
    provider: Provider<Http>,
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    ws_url: String,
    confirm_timeout: Duration,
    confirm_poll: Duration,
}

impl EvmClient {
    pub fn new(
        rpc_http: &str,
        rpc_ws: &str,
        chain_id: u64,
        private_key: &str,
        confirm_timeout: Duration,
        confirm_poll: Duration,
    ) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_http)
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::Transport(format!("invalid signer key: {e}")))?
            .with_chain_id(chain_id);
        info!(signer = ?wallet.address(), chain_id, "evm client initialized");
        let client = SignerMiddleware::new(provider.clone(), wallet);
        Ok(Self {
            provider,
            client,
            ws_url: rpc_ws.to_string(),
            confirm_timeout,
            confirm_poll,
        })
    }

    fn to_typed(&self, call: &ContractCall) -> TypedTransaction {
        TransactionRequest::new()
            .from(self.client.address())
            .to(call.to)
            .data(call.data.clone())
            .value(call.value)
            .into()
    }
}

/// Would-revert responses arrive as provider errors; keep the node's message
/// verbatim so revert reasons survive to the caller.
fn classify_call_error(e: impl std::fmt::Display) -> ChainError {
    let msg = e.to_string();
    if msg.contains("revert") {
        ChainError::Reverted(msg)
    } else {
        ChainError::Transport(msg)
    }
}

fn map_receipt(receipt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        block_number: receipt.block_number.map(|b| b.as_u64()).unwrap_or(0),
        status: receipt.status == Some(U64::from(1)),
    }
}

#[async_trait]
impl ChainReader for EvmClient {
    async fn call(&self, call: &ContractCall) -> Result<Bytes, ChainError> {
        let tx = self.to_typed(call);
        self.provider
            .call(&tx, None)
            .await
            .map_err(classify_call_error)
    }
}

#[async_trait]
impl ChainWriter for EvmClient {
    async fn simulate(&self, call: &ContractCall) -> Result<Simulation, ChainError> {
        let mut tx = self.to_typed(call);
        // eth_call against latest state; this is where would-reverts die free
        let result = self
            .provider
            .call(&tx, None)
            .await
            .map_err(classify_call_error)?;
        self.client
            .fill_transaction(&mut tx, None)
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Simulation {
            result,
            prepared: PreparedRequest { tx },
        })
    }

    async fn send(&self, prepared: PreparedRequest) -> Result<H256, ChainError> {
        let pending = self
            .client
            .send_transaction(prepared.tx, None)
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let tx_hash = *pending;
        debug!(?tx_hash, "transaction accepted by node");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError> {
        let started = tokio::time::Instant::now();
        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(map_receipt(receipt)),
                Ok(None) => {}
                Err(e) => return Err(ChainError::Transport(e.to_string())),
            }
            if started.elapsed() >= self.confirm_timeout {
                // One final re-query before declaring the outcome unknown, so
                // a receipt that landed during the last poll gap is not lost.
                if let Ok(Some(receipt)) = self.provider.get_transaction_receipt(tx_hash).await {
                    return Ok(map_receipt(receipt));
                }
                return Err(ChainError::ConfirmationTimeout {
                    tx_hash,
                    waited_s: self.confirm_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.confirm_poll).await;
        }
    }
}

#[async_trait]
impl LogSubscriber for EvmClient {
    async fn subscribe(
        &self,
        address: Address,
        event_abi: &str,
        event_name: &str,
        on_logs: LogSink,
        on_error: ErrorSink,
    ) -> Result<SubscriptionHandle, ChainError> {
        let event = abi::parse_event(event_abi)?;
        if event.name != event_name {
            return Err(ChainError::Abi(format!(
                "event `{event_name}` does not match fragment `{}`",
                event.name
            )));
        }
        let filter = Filter::new().address(address).topic0(event.signature());
        let ws = Ws::connect(self.ws_url.clone())
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let provider = Provider::new(ws);
        info!(?address, event = %event.name, "subscribing to creation logs");

        let task = tokio::spawn(async move {
            let mut stream = match provider.subscribe_logs(&filter).await {
                Ok(stream) => stream,
                Err(e) => {
                    on_error(ChainError::Transport(e.to_string()));
                    return;
                }
            };
            while let Some(log) = stream.next().await {
                on_logs(vec![log]);
            }
            // The node closed the subscription; the owner decides whether to
            // resubscribe.
            warn!("log subscription stream ended");
            on_error(ChainError::Transport(
                "log subscription closed by node".to_string(),
            ));
        });
        Ok(SubscriptionHandle::new(task))
    }
}
