use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use serde_json::json;
use strum_macros::Display;

use crate::types::pool::Pool;
use crate::types::sniper_config::SniperConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertType {
    PoolMatch,
    TradeExecuted,
    TradeFailed,
}

/// Notification payload plus the snapshot that lets an operator replay why it
/// fired: the full canonical pool and the config values it matched against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub message: String,
    pub severity: Severity,
    pub owner_identity: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn pool_match(pool: &Pool, config: &SniperConfig) -> Self {
        Self {
            alert_type: AlertType::PoolMatch,
            message: format!(
                "New pool matched: {} ({}) on {}/{}: liquidity ${:.0}, mcap ${:.0}",
                pool.base_token.symbol,
                pool.base_token.address,
                pool.chain,
                pool.exchange,
                pool.liquidity_usd,
                pool.market_cap_usd,
            ),
            severity: Severity::Info,
            owner_identity: config.owner_identity.clone(),
            metadata: json!({
                "pool": pool,
                "matched": {
                    "target_chains": config.target_chains,
                    "target_dexs": config.target_dexs,
                    "min_liquidity": config.min_liquidity,
                    "min_market_cap": config.min_market_cap,
                    "max_market_cap": config.max_market_cap,
                    "max_buy_tax": config.max_buy_tax,
                    "max_sell_tax": config.max_sell_tax,
                    "honeypot_check": config.honeypot_check,
                    "lock_check": config.lock_check,
                },
            }),
            created_at: Utc::now(),
        }
    }

    pub fn trade_terminal(
        alert_type: AlertType,
        severity: Severity,
        owner_identity: &str,
        message: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            alert_type,
            message,
            severity,
            owner_identity: owner_identity.to_string(),
            metadata,
            created_at: Utc::now(),
        }
    }
}
