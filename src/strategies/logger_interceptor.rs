use anyhow::Result;
use async_trait::async_trait;
use maplit::hashmap;
use std::fmt::{Debug, Formatter};
use tracing::{debug, info, warn};

use crate::types::engine::{Strategy, StrategyStatus};
use crate::types::events::{Action, BotEvent, ExecutionResult};

/// Passive strategy that traces every engine event for audit. Emits nothing.
pub struct LoggerInterceptorStrategy;

impl Debug for LoggerInterceptorStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoggerInterceptor")
    }
}

impl LoggerInterceptorStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggerInterceptorStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Strategy<BotEvent, Action> for LoggerInterceptorStrategy {
    async fn sync_state(&mut self) -> Result<()> {
        Ok(())
    }

    async fn process_event(&mut self, event: BotEvent) -> Vec<Action> {
        match &event {
            BotEvent::HeartBeat(tick_ms, _) => debug!(tick_ms, "heartbeat"),
            BotEvent::PoolCreated(pool) => info!(
                pair = %pool.pair_address,
                token = %pool.base_token.address,
                "creation event observed"
            ),
            BotEvent::ExecutionResult(ExecutionResult::TradeExecuted {
                trade_id,
                owner_identity,
            }) => info!(%trade_id, owner = %owner_identity, "trade executed"),
            BotEvent::ExecutionResult(ExecutionResult::TradeRejected {
                owner_identity,
                error,
            }) => warn!(owner = %owner_identity, error = %error, "trade rejected"),
            BotEvent::ExecutionResult(ExecutionResult::TradeSimulated { owner_identity }) => {
                info!(owner = %owner_identity, "trade simulated (paper mode)")
            }
        }
        vec![]
    }

    async fn get_status(&self) -> StrategyStatus {
        StrategyStatus::Running(hashmap! {
            "Running".to_owned() => "ok".to_owned(),
        })
    }
}
