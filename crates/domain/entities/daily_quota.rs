use std::collections::BTreeSet;

use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::daily_stats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyQuotaEntity {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub sent_count: i64,
    pub campaign_ids: BTreeSet<String>,
}

/// Raw row used for Diesel queries. Campaign ids stay as JSON.
#[derive(Debug, Clone, Selectable, Queryable, Insertable)]
#[diesel(table_name = daily_stats)]
pub struct DailyQuotaRow {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub sent_count: i64,
    pub campaign_ids: serde_json::Value,
}

impl From<DailyQuotaRow> for DailyQuotaEntity {
    fn from(value: DailyQuotaRow) -> Self {
        let campaign_ids = serde_json::from_value(value.campaign_ids).unwrap_or_default();

        Self {
            tenant_id: value.tenant_id,
            date: value.date,
            sent_count: value.sent_count,
            campaign_ids,
        }
    }
}
