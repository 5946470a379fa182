use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::types::alert::Severity;

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Outbound notification hook, invoked on every discovery match and every
/// trade terminal state. The conversational bot layer is an excluded
/// collaborator living behind this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        identity: &str,
        message: &str,
        severity: Severity,
        metadata: &serde_json::Value,
    ) -> Result<()>;
}

/// Default sink: structured log lines only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        identity: &str,
        message: &str,
        severity: Severity,
        _metadata: &serde_json::Value,
    ) -> Result<()> {
        match severity {
            Severity::Info => info!(identity, %severity, "{message}"),
            Severity::Warning | Severity::Critical => warn!(identity, %severity, "{message}"),
        }
        Ok(())
    }
}

/// POSTs the alert payload to an operator-configured endpoint.
pub struct WebhookNotifier {
    client: Client,
    endpoint: Url,
}

impl WebhookNotifier {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
            endpoint,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        identity: &str,
        message: &str,
        severity: Severity,
        metadata: &serde_json::Value,
    ) -> Result<()> {
        let payload = json!({
            "identity": identity,
            "message": message,
            "severity": severity,
            "metadata": metadata,
        });
        self.client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
