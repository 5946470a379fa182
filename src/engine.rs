use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, Sender};
use tokio::task::JoinSet;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

use crate::config::constants::ENGINE_MESSAGE_CHANNEL_CAPACITY;
use crate::types::engine::{Collector, Executor, Strategy};

/// The main engine. This struct is responsible for orchestrating the data
/// flow between collectors, strategies, and executors.
///
/// Each strategy consumes the event channel serially, which is what makes
/// the discovery loop non-overlapping: a new tick is not processed until the
/// previous cycle finished. Executors run actions on their own tasks, so a
/// slow confirmation never stalls discovery.
pub struct Engine<E, A> {
    /// The set of collectors that the engine will use to collect raw events.
    collectors: Vec<Box<dyn Collector<E>>>,

    /// The set of strategies that the engine will use to process events.
    strategies: Vec<Box<dyn Strategy<E, A>>>,

    /// The set of executors that the engine will use to execute actions.
    executors: Vec<Arc<dyn Executor<A, E>>>,

    /// The capacity of the event channel.
    event_channel_capacity: usize,

    /// The capacity of the action channel.
    action_channel_capacity: usize,
}

impl<E, A> Default for Engine<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, A> Engine<E, A> {
    pub fn new() -> Self {
        Self {
            collectors: vec![],
            strategies: vec![],
            executors: vec![],
            event_channel_capacity: ENGINE_MESSAGE_CHANNEL_CAPACITY,
            action_channel_capacity: ENGINE_MESSAGE_CHANNEL_CAPACITY,
        }
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    pub fn with_action_channel_capacity(mut self, capacity: usize) -> Self {
        self.action_channel_capacity = capacity;
        self
    }

    /// Adds a collector to be used by the engine.
    pub fn add_collector(&mut self, collector: Box<dyn Collector<E>>) {
        self.collectors.push(collector);
    }

    /// Adds a strategy to be used by the engine.
    pub fn add_strategy(&mut self, strategy: Box<dyn Strategy<E, A>>) {
        self.strategies.push(strategy);
    }

    /// Adds an executor to be used by the engine.
    pub fn add_executor(&mut self, executor: Arc<dyn Executor<A, E>>) {
        self.executors.push(executor);
    }
}

impl<E, A> Engine<E, A>
where
    E: Send + Clone + 'static + std::fmt::Debug,
    A: Send + Clone + 'static + std::fmt::Debug,
{
    /// The core run loop of the engine. This function will spawn a task for
    /// each collector, strategy, and executor. It will then orchestrate the
    /// data flow between them.
    pub async fn run(self) -> Result<JoinSet<()>> {
        let (event_sender, _): (Sender<E>, _) = broadcast::channel(self.event_channel_capacity);
        let (action_sender, _): (Sender<A>, _) = broadcast::channel(self.action_channel_capacity);

        let mut set = JoinSet::new();

        // Spawn executors in separate tasks.
        for executor in self.executors {
            let mut receiver = action_sender.subscribe();
            let event_sender = event_sender.clone();
            set.spawn(async move {
                info!("starting executor...");
                loop {
                    match receiver.recv().await {
                        Ok(action) => {
                            let event_sender = event_sender.clone();
                            let executor = executor.clone();
                            tokio::spawn(async move {
                                match executor.execute(action).await {
                                    Ok(Some(event)) => {
                                        if let Err(e) = event_sender.send(event) {
                                            error!("error sending event: {}", e);
                                        }
                                    }
                                    Ok(None) => {}
                                    Err(e) => error!("error executing action: {}", e),
                                }
                            });
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("executor lagging, skipped {skipped} actions")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        // Spawn strategies in separate tasks.
        for mut strategy in self.strategies {
            strategy.sync_state().await?;
            let mut event_receiver = event_sender.subscribe();
            let action_sender = action_sender.clone();
            set.spawn(async move {
                info!("starting strategy {strategy:?}...");
                loop {
                    match event_receiver.recv().await {
                        Ok(event) => {
                            for action in strategy.process_event(event).await {
                                if let Err(e) = action_sender.send(action) {
                                    error!("error sending action: {}", e);
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // coalescing ticks under load is fine; a fresh
                            // cycle sees the current state anyway
                            warn!("strategy lagging, skipped {skipped} events")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        // Spawn collectors in separate tasks.
        for collector in self.collectors {
            let event_sender = event_sender.clone();
            set.spawn(async move {
                info!("starting collector...");
                let collector = collector;
                let mut event_stream = match collector.get_event_stream().await {
                    Ok(stream) => stream,
                    Err(e) => {
                        error!("error getting event stream: {}", e);
                        return;
                    }
                };
                while let Some(event) = event_stream.next().await {
                    if event_sender.send(event).is_err() {
                        break;
                    }
                }
            });
        }

        Ok(set)
    }
}
