use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::domain::repositories::messaging::MessagingGateway;

/// Outbound calls must fail fast; the caller treats timeouts as retryable.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Minimal WhatsApp gateway client built on reqwest. Every call carries the
/// tenant's instance token; the base URL is injected configuration.
pub struct WhatsAppClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    error: GatewayErrorDetails,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetails {
    code: Option<String>,
    message: Option<String>,
}

impl WhatsAppClient {
    pub fn new(base_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (gateway_error_code, gateway_error_message) =
            match serde_json::from_str::<GatewayErrorEnvelope>(&body) {
                Ok(envelope) => (envelope.error.code, envelope.error.message),
                Err(_) => (None, None),
            };

        error!(
            status = %status,
            gateway_error_code = ?gateway_error_code,
            gateway_error_message = ?gateway_error_message,
            context = %context,
            "whatsapp gateway request failed"
        );

        anyhow::bail!(
            "WhatsApp gateway request failed: {} (status {})",
            context,
            status
        );
    }
}

#[async_trait]
impl MessagingGateway for WhatsAppClient {
    async fn set_webhook(&self, instance_token: &str, webhook_url: &str) -> Result<()> {
        let body = json!({
            "webhook": webhook_url,
            "enabled": !webhook_url.is_empty(),
        });

        let resp = self
            .http
            .post(format!("{}/instance/webhook", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", instance_token))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(resp, "set webhook").await?;

        Ok(())
    }

    async fn send_text(&self, instance_token: &str, number: &str, text: &str) -> Result<()> {
        let body = json!({
            "number": number,
            "text": text,
        });

        let resp = self
            .http
            .post(format!("{}/message/text", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", instance_token))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(resp, "send text").await?;

        Ok(())
    }

    async fn send_media(
        &self,
        instance_token: &str,
        number: &str,
        media_type: &str,
        media_url: &str,
    ) -> Result<()> {
        let body = json!({
            "number": number,
            "type": media_type,
            "url": media_url,
        });

        let resp = self
            .http
            .post(format!("{}/message/media", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", instance_token))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(resp, "send media").await?;

        Ok(())
    }
}
