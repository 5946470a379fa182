use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use url::Url;

use crate::chain::evm::EvmClient;
use crate::chain::{ChainReader, ChainWriter, LogSubscriber};
use crate::config::constants::RECENT_POOLS_CAPACITY;
use crate::config::settings::Settings;
use crate::market_data::aggregator::MarketDataAggregator;
use crate::market_data::providers::birdeye::BirdeyeProvider;
use crate::market_data::providers::dexscreener::DexScreenerProvider;
use crate::market_data::providers::geckoterminal::GeckoTerminalProvider;
use crate::market_data::providers::MarketDataProvider;
use crate::market_data::recent::RecentPools;
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::storage::Stores;

/// App context we pass around: shared clients, stores and settings. Every
/// chain- or network-facing dependency is a trait handle so pipelines for
/// several chains can coexist and tests can swap in fakes.
#[derive(Clone)]
pub struct AppContext {
    pub(crate) settings: Arc<RwLock<Settings>>,
    pub(crate) reader: Arc<dyn ChainReader>,
    pub(crate) writer: Arc<dyn ChainWriter>,
    pub(crate) subscriber: Arc<dyn LogSubscriber>,
    pub(crate) aggregator: Arc<MarketDataAggregator>,
    pub(crate) recent_pools: Arc<RecentPools>,
    pub(crate) stores: Stores,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Load settings, set up logging, and wire the production clients.
    pub async fn from_config(config_filename: &str) -> Result<Self> {
        let settings = Settings::new(config_filename).context("failed to load settings")?;

        let filter = tracing_subscriber::EnvFilter::new(&settings.logger.level)
            .add_directive("hyper::client=info".parse().unwrap())
            .add_directive("reqwest=info".parse().unwrap())
            .add_directive("ethers_providers=info".parse().unwrap());
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter)
            .init();

        let chain = Arc::new(EvmClient::new(
            &settings.chain.rpc_http,
            &settings.chain.rpc_ws,
            settings.chain.chain_id,
            &settings.executor.private_key,
            Duration::from_secs(settings.executor.confirm_timeout_s),
            Duration::from_millis(settings.executor.confirm_poll_ms),
        )?);

        let aggregator = Arc::new(MarketDataAggregator::new(
            build_providers(&settings),
            Duration::from_secs(settings.aggregator.provider_timeout_s),
            &settings.chain.name,
            &settings.chain.exchange,
        ));

        let notifier: Arc<dyn Notifier> = match &settings.notifier.webhook_url {
            Some(raw) => {
                let endpoint = Url::parse(raw).context("invalid notifier.webhook_url")?;
                info!(%endpoint, "using webhook notifier");
                Arc::new(WebhookNotifier::new(endpoint))
            }
            None => Arc::new(LogNotifier),
        };

        Ok(Self::assemble(
            settings,
            chain.clone(),
            chain.clone(),
            chain,
            aggregator,
            Stores::in_memory(),
            notifier,
        ))
    }

    /// Wire a context from parts. Used by `from_config` and by tests that
    /// substitute fakes for the chain and the providers.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        settings: Settings,
        reader: Arc<dyn ChainReader>,
        writer: Arc<dyn ChainWriter>,
        subscriber: Arc<dyn LogSubscriber>,
        aggregator: Arc<MarketDataAggregator>,
        stores: Stores,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            reader,
            writer,
            subscriber,
            aggregator,
            recent_pools: Arc::new(RecentPools::new(RECENT_POOLS_CAPACITY)),
            stores,
            notifier,
        }
    }

    pub async fn get_settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().await
    }
}

fn build_providers(settings: &Settings) -> Vec<Arc<dyn MarketDataProvider>> {
    let chain = &settings.chain.name;
    let mut providers: Vec<Arc<dyn MarketDataProvider>> = Vec::new();
    for (name, endpoint) in &settings.aggregator.providers {
        match name.as_str() {
            "dexscreener" => {
                providers.push(Arc::new(DexScreenerProvider::new(&endpoint.base_url, chain)))
            }
            "geckoterminal" => providers.push(Arc::new(GeckoTerminalProvider::new(
                &endpoint.base_url,
                chain,
            ))),
            "birdeye" => providers.push(Arc::new(BirdeyeProvider::new(&endpoint.base_url, chain))),
            other => warn!(provider = other, "unknown market-data provider, skipping"),
        }
    }
    if providers.is_empty() {
        warn!("no market-data providers configured; every cycle will be synthetic");
    }
    providers
}
