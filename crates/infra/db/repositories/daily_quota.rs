use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::daily_stats};
use domain::{
    entities::daily_quota::{DailyQuotaEntity, DailyQuotaRow},
    repositories::daily_quota::DailyQuotaRepository,
};

pub struct DailyQuotaPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DailyQuotaPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DailyQuotaRepository for DailyQuotaPostgres {
    async fn find(&self, tenant_id: Uuid, date: NaiveDate) -> Result<Option<DailyQuotaEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = daily_stats::table
            .find((tenant_id, date))
            .select(DailyQuotaRow::as_select())
            .first::<DailyQuotaRow>(&mut conn)
            .optional()?;

        Ok(row.map(DailyQuotaEntity::from))
    }

    async fn increment_if_below(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        campaign_id: &str,
        limit: i64,
    ) -> Result<(bool, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Row lock closes the read-then-write race: two concurrent sends
        // serialize here instead of both observing the same count.
        let outcome = conn.transaction::<(bool, i64), diesel::result::Error, _>(|conn| {
            let existing = daily_stats::table
                .find((tenant_id, date))
                .select(DailyQuotaRow::as_select())
                .for_update()
                .first::<DailyQuotaRow>(conn)
                .optional()?;

            match existing {
                Some(row) => {
                    if row.sent_count >= limit {
                        return Ok((false, row.sent_count));
                    }

                    let mut campaign_ids: BTreeSet<String> =
                        serde_json::from_value(row.campaign_ids).unwrap_or_default();
                    campaign_ids.insert(campaign_id.to_string());
                    let new_count = row.sent_count + 1;

                    update(daily_stats::table.find((tenant_id, date)))
                        .set((
                            daily_stats::sent_count.eq(new_count),
                            daily_stats::campaign_ids
                                .eq(serde_json::to_value(&campaign_ids).unwrap_or_default()),
                        ))
                        .execute(conn)?;

                    Ok((true, new_count))
                }
                None => {
                    if limit <= 0 {
                        return Ok((false, 0));
                    }

                    let row = DailyQuotaRow {
                        tenant_id,
                        date,
                        sent_count: 1,
                        campaign_ids: serde_json::json!([campaign_id]),
                    };
                    insert_into(daily_stats::table).values(&row).execute(conn)?;

                    Ok((true, 1))
                }
            }
        })?;

        Ok(outcome)
    }

    async fn delete(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted =
            diesel::delete(daily_stats::table.find((tenant_id, date))).execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
