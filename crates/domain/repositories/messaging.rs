use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

/// Seam over the per-tenant WhatsApp gateway API. `instance_token`
/// identifies the tenant's gateway instance on every call.
#[async_trait]
#[automock]
pub trait MessagingGateway: Send + Sync {
    /// Sets the instance's outbound callback URL. The empty string clears
    /// it; a downgraded tenant must stop receiving automation callbacks.
    async fn set_webhook(&self, instance_token: &str, webhook_url: &str) -> Result<()>;

    async fn send_text(&self, instance_token: &str, number: &str, text: &str) -> Result<()>;

    async fn send_media(
        &self,
        instance_token: &str,
        number: &str,
        media_type: &str,
        media_url: &str,
    ) -> Result<()>;
}
