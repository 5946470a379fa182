use async_trait::async_trait;
use chrono::Utc;
use ethers::abi::Event;
use ethers::types::{Address, Log};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};

use crate::chain::{abi, erc20, ErrorSink, LogSink, SubscriptionHandle};
use crate::config::app_context::AppContext;
use crate::types::engine::{Collector, EventStream};
use crate::types::events::BotEvent;
use crate::types::pool::{Pool, TokenInfo};

/// The Chain Event Source: subscribes to the factory's creation event and
/// turns matching logs into normalized creation pools. Creation logs whose
/// counter-asset is not the configured base asset are dropped silently.
pub struct PoolCreatedCollector {
    context: AppContext,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

impl PoolCreatedCollector {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
            subscription: Mutex::new(None),
        }
    }

    /// Tear the subscription down. The engine never calls this; it exists for
    /// owners embedding the collector in their own lifecycle.
    pub async fn unsubscribe(&self) {
        if let Some(handle) = self.subscription.lock().await.take() {
            handle.unsubscribe();
        }
    }
}

/// Decode one creation log into the canonical pool shape. On-chain fields
/// only; market-data numerics stay zero until a provider reports them.
/// Returns `None` for logs that do not involve the base asset.
pub(crate) fn normalize_creation_log(
    event: &Event,
    log: &Log,
    wrapped_native: Address,
    chain: &str,
    exchange: &str,
) -> Option<Pool> {
    let tokens = abi::decode_log(event, log)?;
    let token0 = tokens.first()?.clone().into_address()?;
    let token1 = tokens.get(1)?.clone().into_address()?;
    let pair = tokens.get(2)?.clone().into_address()?;

    let base = if token0 == wrapped_native {
        token1
    } else if token1 == wrapped_native {
        token0
    } else {
        return None;
    };

    Some(Pool {
        chain: chain.to_string(),
        exchange: exchange.to_string(),
        pair_address: format!("{pair:#x}"),
        base_token: TokenInfo {
            address: format!("{base:#x}"),
            symbol: String::new(),
            name: String::new(),
            decimals: 18,
        },
        quote_token: TokenInfo {
            address: format!("{wrapped_native:#x}"),
            symbol: String::new(),
            name: String::new(),
            decimals: 18,
        },
        created_at_unix: Utc::now().timestamp(),
        ..Default::default()
    })
}

#[async_trait]
impl Collector<BotEvent> for PoolCreatedCollector {
    async fn get_event_stream(&self) -> anyhow::Result<EventStream<'_, BotEvent>> {
        let (chain_cfg, factory, wrapped_native) = {
            let settings = self.context.get_settings().await;
            (
                settings.chain.clone(),
                settings.chain.factory()?,
                settings.chain.wrapped_native_address()?,
            )
        };
        let event = abi::parse_event(&chain_cfg.pair_created_event)?;

        let (pool_tx, mut pool_rx) = mpsc::unbounded_channel::<Pool>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<BotEvent>();

        let chain_name = chain_cfg.name.clone();
        let exchange = chain_cfg.exchange.clone();
        let on_logs: LogSink = Arc::new(move |logs| {
            for log in logs {
                if let Some(pool) =
                    normalize_creation_log(&event, &log, wrapped_native, &chain_name, &exchange)
                {
                    let _ = pool_tx.send(pool);
                }
            }
        });
        // delivered here instead of panicking in the caller's stack; the
        // owner decides whether to resubscribe
        let on_error: ErrorSink = Arc::new(|err| {
            error!(error = %err, "creation-log subscription error");
        });

        let handle = self
            .context
            .subscriber
            .subscribe(
                factory,
                &chain_cfg.pair_created_event,
                &chain_cfg.pair_created_event_name,
                on_logs,
                on_error,
            )
            .await?;
        *self.subscription.lock().await = Some(handle);
        info!(factory = %chain_cfg.factory_address, "pool creation collector subscribed");

        // bridge into the async world: enrich with the token's getters,
        // remember the pool for ranking merges, then hand it to the engine
        let recent_pools = Arc::clone(&self.context.recent_pools);
        let reader = Arc::clone(&self.context.reader);
        tokio::spawn(async move {
            while let Some(mut pool) = pool_rx.recv().await {
                if let Ok(token) = pool.base_token.address.parse() {
                    let metadata = erc20::token_metadata(reader.as_ref(), token).await;
                    pool.base_token.symbol = metadata.symbol;
                    pool.base_token.name = metadata.name;
                    pool.base_token.decimals = metadata.decimals;
                }
                recent_pools.push(pool.clone()).await;
                if event_tx.send(BotEvent::PoolCreated(pool)).is_err() {
                    break;
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(event_rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Bytes, H256, U256};

    fn creation_log(event: &Event, token0: Address, token1: Address, pair: Address) -> Log {
        let mut data = Vec::new();
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(pair.as_bytes());
        data.extend_from_slice(&word);
        let mut len_word = [0u8; 32];
        U256::from(1u64).to_big_endian(&mut len_word);
        data.extend_from_slice(&len_word);
        Log {
            topics: vec![event.signature(), H256::from(token0), H256::from(token1)],
            data: Bytes::from(data),
            ..Default::default()
        }
    }

    fn parsed_event() -> Event {
        abi::parse_event(
            "event PairCreated(address indexed token0, address indexed token1, address pair, uint256)",
        )
        .unwrap()
    }

    #[test]
    fn pairs_with_wrapped_native_are_normalized() {
        let event = parsed_event();
        let weth = Address::repeat_byte(0xee);
        let token = Address::repeat_byte(0x01);
        let pair = Address::repeat_byte(0x02);

        let log = creation_log(&event, weth, token, pair);
        let pool = normalize_creation_log(&event, &log, weth, "ethereum", "uniswap-v2").unwrap();
        assert_eq!(pool.base_token.address, format!("{token:#x}"));
        assert_eq!(pool.quote_token.address, format!("{weth:#x}"));
        assert_eq!(pool.pair_address, format!("{pair:#x}"));
        assert!(!pool.synthetic);

        // base asset on the other side works the same
        let log = creation_log(&event, token, weth, pair);
        let pool = normalize_creation_log(&event, &log, weth, "ethereum", "uniswap-v2").unwrap();
        assert_eq!(pool.base_token.address, format!("{token:#x}"));
    }

    #[test]
    fn pairs_without_base_asset_are_dropped() {
        let event = parsed_event();
        let weth = Address::repeat_byte(0xee);
        let log = creation_log(
            &event,
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Address::repeat_byte(0x03),
        );
        assert!(normalize_creation_log(&event, &log, weth, "ethereum", "uniswap-v2").is_none());
    }

    #[tokio::test]
    async fn subscription_logs_become_events_and_feed_ranking_merges() {
        use crate::test_support::{self, CapturingSubscriber, FakeWriter};
        use tokio_stream::StreamExt;

        let subscriber = Arc::new(CapturingSubscriber::new());
        let harness = test_support::harness(FakeWriter::new(), subscriber.clone());
        let collector = PoolCreatedCollector::new(&harness.context);
        let mut stream = collector.get_event_stream().await.unwrap();

        let event = parsed_event();
        // the configured wrapped-native address from the test settings
        let weth: Address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            .parse()
            .unwrap();
        let token = Address::repeat_byte(0x01);
        subscriber
            .push_logs(vec![
                creation_log(&event, weth, token, Address::repeat_byte(0x02)),
                // non-native pair: dropped silently
                creation_log(
                    &event,
                    Address::repeat_byte(0x03),
                    Address::repeat_byte(0x04),
                    Address::repeat_byte(0x05),
                ),
            ])
            .await;

        match stream.next().await.unwrap() {
            BotEvent::PoolCreated(pool) => {
                assert_eq!(pool.base_token.address, format!("{token:#x}"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // the same record is remembered for merging into ranking batches
        let recent = harness.context.recent_pools.snapshot().await;
        assert_eq!(recent.len(), 1);

        collector.unsubscribe().await;
    }
}
