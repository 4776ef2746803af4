use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::system_admins};
use domain::{
    entities::admins::{AdminBootstrapOutcome, AdminDirectoryEntity},
    repositories::admins::AdminDirectoryRepository,
};

pub struct AdminDirectoryPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AdminDirectoryPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AdminDirectoryRepository for AdminDirectoryPostgres {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<AdminDirectoryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = system_admins::table
            .find(uid)
            .select(AdminDirectoryEntity::as_select())
            .first::<AdminDirectoryEntity>(&mut conn)
            .optional()?;

        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminDirectoryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = system_admins::table
            .filter(system_admins::email.eq(email))
            .select(AdminDirectoryEntity::as_select())
            .first::<AdminDirectoryEntity>(&mut conn)
            .optional()?;

        Ok(record)
    }

    async fn upsert_active(&self, uid: &str, email: &str) -> Result<AdminBootstrapOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = system_admins::table
            .find(uid)
            .select(AdminDirectoryEntity::as_select())
            .first::<AdminDirectoryEntity>(&mut conn)
            .optional()?;

        match existing {
            Some(record) if record.active => Ok(AdminBootstrapOutcome::AlreadyActive),
            Some(_) => {
                update(system_admins::table.find(uid))
                    .set((
                        system_admins::active.eq(true),
                        system_admins::email.eq(email),
                    ))
                    .execute(&mut conn)?;

                Ok(AdminBootstrapOutcome::Reactivated)
            }
            None => {
                insert_into(system_admins::table)
                    .values((
                        system_admins::uid.eq(uid),
                        system_admins::email.eq(email),
                        system_admins::active.eq(true),
                        system_admins::created_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)?;

                Ok(AdminBootstrapOutcome::Created)
            }
        }
    }
}
