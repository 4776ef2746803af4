use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::daily_quota::DailyQuotaEntity;

#[async_trait]
#[automock]
pub trait DailyQuotaRepository {
    async fn find(&self, tenant_id: Uuid, date: NaiveDate) -> Result<Option<DailyQuotaEntity>>;

    /// Atomically increments the day's counter and records the campaign id,
    /// unless the counter is already at `limit`. Returns `(allowed, count)`
    /// where `count` is the value after the call. Absent record counts as 0.
    ///
    /// Implementations must make the read-check-write a single atomic unit
    /// (row lock or transaction); two concurrent sends must never both read
    /// the same count.
    async fn increment_if_below(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        campaign_id: &str,
        limit: i64,
    ) -> Result<(bool, i64)>;

    /// Deletes the record outright; the next increment recreates it from
    /// zero. Returns true when a record existed.
    async fn delete(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool>;
}
