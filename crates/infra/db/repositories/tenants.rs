use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::tenants};
use domain::{entities::tenants::TenantEntity, repositories::tenants::TenantRepository};

pub struct TenantPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TenantPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TenantRepository for TenantPostgres {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<TenantEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let tenant = tenants::table
            .filter(tenants::id.eq(tenant_id))
            .select(TenantEntity::as_select())
            .first::<TenantEntity>(&mut conn)
            .optional()?;

        Ok(tenant)
    }

    async fn list_connected(&self) -> Result<Vec<TenantEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = tenants::table
            .filter(tenants::whatsapp_connected.eq(true))
            .select(TenantEntity::as_select())
            .load::<TenantEntity>(&mut conn)?;

        Ok(results)
    }

    async fn update_webhook_configured(
        &self,
        tenant_id: Uuid,
        webhook_url: Option<String>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(tenants::table)
            .filter(tenants::id.eq(tenant_id))
            .set((
                tenants::webhook_configured.eq(webhook_url),
                tenants::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn assign_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
        access_expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(tenants::table)
            .filter(tenants::id.eq(tenant_id))
            .set((
                tenants::plan_id.eq(plan_id),
                tenants::access_expires_at.eq(access_expires_at),
                tenants::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
