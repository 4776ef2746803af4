use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::contacts;

/// Minimal per-tenant contact record consumed by the reminder jobs.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = contacts)]
pub struct ContactEntity {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub phone: String,
    pub birth_month: Option<i32>,
    pub birth_day: Option<i32>,
    pub last_visit_at: Option<DateTime<Utc>>,
}
