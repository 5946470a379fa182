pub mod alert_executor;
pub mod paper_executor;
pub mod proxy_wallet;
pub mod trade_executor;

pub use alert_executor::{AlertEmitter, AlertExecutor};
pub use paper_executor::PaperTradeExecutor;
pub use proxy_wallet::ProxyWalletManager;
pub use trade_executor::{TradeActionExecutor, TradeExecutor};
