use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, prelude::*};
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::contacts};
use domain::{entities::contacts::ContactEntity, repositories::contacts::ContactRepository};

pub struct ContactPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ContactPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ContactRepository for ContactPostgres {
    async fn list_birthday_contacts(
        &self,
        tenant_id: Uuid,
        month: i32,
        day: i32,
    ) -> Result<Vec<ContactEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = contacts::table
            .filter(contacts::tenant_id.eq(tenant_id))
            .filter(contacts::birth_month.eq(month))
            .filter(contacts::birth_day.eq(day))
            .select(ContactEntity::as_select())
            .load::<ContactEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_return_due_contacts(
        &self,
        tenant_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ContactEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = contacts::table
            .filter(contacts::tenant_id.eq(tenant_id))
            .filter(contacts::last_visit_at.ge(window_start))
            .filter(contacts::last_visit_at.lt(window_end))
            .select(ContactEntity::as_select())
            .load::<ContactEntity>(&mut conn)?;

        Ok(results)
    }
}
