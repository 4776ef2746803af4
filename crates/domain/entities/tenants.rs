use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::tenants;

/// A business account. The embedded subscription state (`plan_id`,
/// `access_expires_at`) is what the access evaluator reads.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = tenants)]
pub struct TenantEntity {
    pub id: Uuid,
    pub business_name: String,
    pub plan_id: Uuid,
    pub access_expires_at: Option<DateTime<Utc>>,
    pub whatsapp_connected: bool,
    pub instance_token: String,
    pub webhook_configured: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
