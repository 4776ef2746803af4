use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::tenants::TenantEntity;

#[async_trait]
#[automock]
pub trait TenantRepository {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<TenantEntity>>;

    /// Tenants with a connected WhatsApp instance, the population every
    /// batch sweep operates on.
    async fn list_connected(&self) -> Result<Vec<TenantEntity>>;

    /// Persists the webhook URL last pushed to the gateway. `None` records
    /// an explicitly cleared webhook.
    async fn update_webhook_configured(
        &self,
        tenant_id: Uuid,
        webhook_url: Option<String>,
    ) -> Result<()>;

    /// Payment confirmation and admin override both land here.
    async fn assign_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
        access_expires_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}
