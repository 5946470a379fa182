use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

use crate::config::app_context::AppContext;
use crate::types::alert::Alert;
use crate::types::engine::Executor;
use crate::types::events::{Action, BotEvent};

/// Converts matches and trade terminal states into persisted alerts plus the
/// outbound notify hook. Both failures are logged, never escalated: alerting
/// must not take the discovery pipeline down.
pub struct AlertEmitter {
    context: AppContext,
}

impl AlertEmitter {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn emit(&self, alert: Alert) {
        if let Err(e) = self.context.stores.alerts.insert_alert(alert.clone()).await {
            error!(owner = %alert.owner_identity, error = %e, "failed to persist alert");
        }
        if let Err(e) = self
            .context
            .notifier
            .notify(
                &alert.owner_identity,
                &alert.message,
                alert.severity,
                &alert.metadata,
            )
            .await
        {
            error!(owner = %alert.owner_identity, error = %e, "notifier failed");
        }
    }
}

/// Engine adapter delivering `SendAlert` actions.
pub struct AlertExecutor {
    emitter: AlertEmitter,
}

impl AlertExecutor {
    pub fn new(context: &AppContext) -> Self {
        Self {
            emitter: AlertEmitter::new(context),
        }
    }
}

#[async_trait]
impl Executor<Action, BotEvent> for AlertExecutor {
    async fn execute(&self, action: Action) -> Result<Option<BotEvent>> {
        if let Action::SendAlert(alert) = action {
            self.emitter.emit(alert).await;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness_with_writer, FakeWriter};
    use crate::types::alert::Severity;
    use crate::types::pool::Pool;
    use crate::types::sniper_config::SniperConfig;

    #[tokio::test]
    async fn match_alert_is_persisted_and_delivered() {
        let harness = harness_with_writer(FakeWriter::new());
        let executor = AlertExecutor::new(&harness.context);

        let pool = Pool {
            chain: "ethereum".to_string(),
            ..Default::default()
        };
        let config = SniperConfig {
            owner_identity: "tg:7".to_string(),
            min_liquidity: 10_000.0,
            ..Default::default()
        };
        let alert = Alert::pool_match(&pool, &config);

        let out = executor
            .execute(Action::SendAlert(alert))
            .await
            .unwrap();
        assert!(out.is_none());

        let stored = harness.alerts.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].owner_identity, "tg:7");
        // metadata snapshot carries the pool and the matched thresholds
        assert_eq!(stored[0].metadata["matched"]["min_liquidity"], 10_000.0);
        assert_eq!(stored[0].metadata["pool"]["chain"], "ethereum");

        let delivered = harness.notifier.snapshot().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "tg:7");
        assert_eq!(delivered[0].2, Severity::Info);
    }
}
