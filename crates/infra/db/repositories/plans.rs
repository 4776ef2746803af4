use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::plans};
use domain::{
    entities::plans::{PlanEntity, PlanRow, UpsertPlanRow},
    repositories::plans::PlanRepository,
    value_objects::{
        enums::plan_statuses::PlanStatus,
        plans::{FREE_PLAN_ID, LEGACY_TRIAL_PLAN_ID},
    },
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = plans::table
            .filter(plans::id.eq(plan_id))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .optional()?;

        Ok(row.map(PlanEntity::from))
    }

    async fn list_paid_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = plans::table
            .filter(plans::status.eq(PlanStatus::Active.to_string()))
            .filter(plans::price_minor.gt(0))
            .filter(plans::id.ne(FREE_PLAN_ID))
            .filter(plans::id.ne(LEGACY_TRIAL_PLAN_ID))
            .order(plans::price_minor.asc())
            .select(PlanRow::as_select())
            .load::<PlanRow>(&mut conn)?;

        Ok(rows.into_iter().map(PlanEntity::from).collect())
    }

    async fn list_all_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = plans::table
            .order(plans::price_minor.asc())
            .select(PlanRow::as_select())
            .load::<PlanRow>(&mut conn)?;

        Ok(rows.into_iter().map(PlanEntity::from).collect())
    }

    async fn upsert_plan(&self, plan: PlanEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = UpsertPlanRow::from(&plan);
        insert_into(plans::table)
            .values(&row)
            .on_conflict(plans::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted =
            diesel::delete(plans::table.filter(plans::id.eq(plan_id))).execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
