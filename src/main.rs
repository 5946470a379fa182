use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use pool_sniper::collectors::heartbeat_collector::HeartbeatCollector;
use pool_sniper::collectors::pool_created_collector::PoolCreatedCollector;
use pool_sniper::config::app_context::AppContext;
use pool_sniper::config::constants::ENGINE_MESSAGE_CHANNEL_CAPACITY;
use pool_sniper::config::settings::Mode;
use pool_sniper::engine::Engine;
use pool_sniper::executors::{AlertExecutor, PaperTradeExecutor, TradeActionExecutor};
use pool_sniper::service::SniperService;
use pool_sniper::strategies::{LoggerInterceptorStrategy, SniperStrategy};
use pool_sniper::types::events::{Action, BotEvent};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // Load settings from config.toml and set up the shared clients; panics
    // here are configuration errors the operator must fix.
    let context = AppContext::from_config("config").await?;
    let settings = context.get_settings().await;
    info!("Starting the pool sniper with settings: {settings:?}");
    let mode = settings.engine.mode.clone();
    drop(settings);

    info!("Initializing engine..");
    let mut engine: Engine<BotEvent, Action> = Engine::new()
        .with_event_channel_capacity(ENGINE_MESSAGE_CHANNEL_CAPACITY)
        .with_action_channel_capacity(ENGINE_MESSAGE_CHANNEL_CAPACITY);

    // collectors: the factory subscription and the fixed-interval poller
    engine.add_collector(Box::new(PoolCreatedCollector::new(&context)));
    engine.add_collector(Box::new(HeartbeatCollector::new(&context).await));

    // strategies: the decision core plus the audit logger
    engine.add_strategy(Box::new(SniperStrategy::new(&context).await?));
    engine.add_strategy(Box::new(LoggerInterceptorStrategy::new()));

    // the service facade shares its trade executor with the engine so the
    // collaborator path and the automated path behave identically
    let service = SniperService::new(&context);
    match mode {
        Mode::Live => {
            engine.add_executor(Arc::new(TradeActionExecutor::new(service.trade_executor())));
        }
        Mode::PaperTrading => {
            info!("paper trading mode: trades are simulated, never broadcast");
            engine.add_executor(Arc::new(PaperTradeExecutor::new(&context)));
        }
    }
    engine.add_executor(Arc::new(AlertExecutor::new(&context)));

    info!("Engine started");
    if let Ok(mut set) = engine.run().await {
        while let Some(res) = set.join_next().await {
            info!("task finished: {res:?}");
        }
    }
    Ok(())
}
