use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

use crate::config::app_context::AppContext;
use crate::types::engine::{Collector, EventStream};
use crate::types::events::BotEvent;

/// Emits the fixed-interval discovery tick. The strategy consumes ticks
/// serially, so one discovery cycle always completes before the next starts;
/// ticks that land while a cycle is still running are simply delayed.
pub struct HeartbeatCollector {
    delay_ms: u64,
}

impl HeartbeatCollector {
    pub async fn new(context: &AppContext) -> Self {
        Self {
            delay_ms: context
                .get_settings()
                .await
                .collector
                .discovery_interval_ms,
        }
    }
}

#[async_trait]
impl Collector<BotEvent> for HeartbeatCollector {
    async fn get_event_stream(&self) -> anyhow::Result<EventStream<'_, BotEvent>> {
        info!("Initializing HeartbeatCollector event stream");
        let (tx, rx) = mpsc::unbounded_channel();
        let delay = self.delay_ms;
        let mut interval = tokio::time::interval(Duration::from_millis(delay));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                if tx.send(BotEvent::HeartBeat(delay, Instant::now())).is_err() {
                    break;
                }
            }
        });
        let stream = UnboundedReceiverStream::new(rx);
        Ok(Box::pin(stream))
    }
}
