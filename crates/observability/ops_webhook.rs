use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::notifier::{AlertEvent, AlertSink};

/// Posts alerts as a JSON payload to the configured ops webhook.
pub(crate) struct OpsWebhookSink {
    http: reqwest::Client,
    webhook_url: Url,
}

impl OpsWebhookSink {
    pub(crate) fn new(webhook_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl AlertSink for OpsWebhookSink {
    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let fields: Vec<String> = event
            .fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();

        let payload = json!({
            "level": event.level.to_string(),
            "timestamp": event.timestamp.to_rfc3339(),
            "service": event.service_name,
            "environment": event.environment,
            "component": event.component,
            "target": event.target,
            "message": event.message,
            "fields": fields,
        });

        let resp = self
            .http
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("ops webhook returned status {}", resp.status());
        }

        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "ops_webhook"
    }
}
