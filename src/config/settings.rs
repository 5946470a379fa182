use config::{Config, ConfigError, File, Map};
use ethers::types::Address;
use serde_derive::Deserialize;

pub type ProviderName = String;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    PaperTrading,
    Live,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    /// Chain name as providers report it, e.g. "ethereum".
    pub name: String,
    /// Exchange whose factory we watch, e.g. "uniswap-v2".
    pub exchange: String,
    pub chain_id: u64,
    pub rpc_http: String,
    pub rpc_ws: String,
    pub factory_address: String,
    /// Human-readable fragment of the creation event.
    pub pair_created_event: String,
    pub pair_created_event_name: String,
    pub wrapped_native: String,
    /// Factory contract that deploys per-user proxy wallets.
    pub proxy_factory: String,
}

impl ChainSettings {
    pub fn factory(&self) -> anyhow::Result<Address> {
        Ok(self.factory_address.parse()?)
    }

    pub fn wrapped_native_address(&self) -> anyhow::Result<Address> {
        Ok(self.wrapped_native.parse()?)
    }

    pub fn proxy_factory_address(&self) -> anyhow::Result<Address> {
        Ok(self.proxy_factory.parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    pub discovery_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoint {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorSettings {
    #[serde(default = "default_provider_timeout_s")]
    pub provider_timeout_s: u64,
    pub providers: Map<ProviderName, ProviderEndpoint>,
}

fn default_provider_timeout_s() -> u64 {
    10
}

#[derive(Clone, Deserialize)]
pub struct ExecutorSettings {
    pub private_key: String,
    pub confirm_timeout_s: u64,
    pub confirm_poll_ms: u64,
}

// keep the signer key out of debug output
impl std::fmt::Debug for ExecutorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorSettings")
            .field("private_key", &"<hidden>")
            .field("confirm_timeout_s", &self.confirm_timeout_s)
            .field("confirm_poll_ms", &self.confirm_poll_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub mode: Mode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerSettings {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub chain: ChainSettings,
    pub collector: CollectorSettings,
    pub aggregator: AggregatorSettings,
    pub executor: ExecutorSettings,
    pub engine: EngineSettings,
    pub notifier: NotifierSettings,
    pub logger: LoggerSettings,
}

impl Settings {
    pub fn new(config_filename: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(config_filename))
            .build()?;
        s.try_deserialize()
    }
}
