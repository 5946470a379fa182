use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::collections::HashMap;
use std::fmt::Debug;
use std::pin::Pin;

/// A stream of events emitted by a [Collector](Collector).
pub type EventStream<'a, E> = Pin<Box<dyn Stream<Item = E> + Send + 'a>>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StrategyStatus {
    Running(HashMap<String, String>),
    Stopped,
}

/// Collector trait, which defines a source of raw events, like a pool
/// creation log on a dex or a discovery tick.
#[async_trait]
pub trait Collector<E>: Send + Sync {
    /// Returns the core event stream for the collector.
    async fn get_event_stream(&self) -> Result<EventStream<'_, E>>;
}

/// Strategy trait, which defines the core logic for each opportunity.
#[async_trait]
pub trait Strategy<E, A>: Send + Sync + Debug {
    /// Sync the initial state of the strategy if needed, usually by fetching
    /// onchain data.
    async fn sync_state(&mut self) -> Result<()>;

    /// Process an event, and return actions if needed.
    async fn process_event(&mut self, event: E) -> Vec<A>;

    async fn get_status(&self) -> StrategyStatus;
}

/// Executor trait, responsible for executing actions returned by strategies.
/// An executor that does not handle a given action variant returns `Ok(None)`
/// so that several executors can share one action channel.
#[async_trait]
pub trait Executor<A, E>: Send + Sync {
    /// Execute an action, optionally feeding an event back into the engine.
    async fn execute(&self, action: A) -> Result<Option<E>>;
}
