use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    entities::daily_quota::DailyQuotaEntity,
    repositories::daily_quota::DailyQuotaRepository,
    value_objects::quota::QuotaDecision,
};

/// Per-tenant, per-day outbound message ledger. Absent records count as
/// zero; quota exhaustion is a decision, not an error. The date is pinned by
/// the caller at batch start so a batch straddling midnight stays on one
/// ledger day.
pub struct QuotaUseCase<Q>
where
    Q: DailyQuotaRepository + Send + Sync + 'static,
{
    quota_repo: Arc<Q>,
}

impl<Q> QuotaUseCase<Q>
where
    Q: DailyQuotaRepository + Send + Sync + 'static,
{
    pub fn new(quota_repo: Arc<Q>) -> Self {
        Self { quota_repo }
    }

    pub async fn check_and_increment(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        campaign_id: &str,
        limit: i64,
    ) -> Result<QuotaDecision> {
        let (allowed, sent_count) = self
            .quota_repo
            .increment_if_below(tenant_id, date, campaign_id, limit)
            .await?;

        if allowed {
            debug!(
                %tenant_id,
                %date,
                campaign_id,
                sent_count,
                "quota: send accounted"
            );
        } else {
            info!(
                %tenant_id,
                %date,
                campaign_id,
                sent_count,
                limit,
                "quota: daily limit reached"
            );
        }

        Ok(QuotaDecision {
            allowed,
            sent_count,
        })
    }

    pub async fn peek(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyQuotaEntity>> {
        self.quota_repo.find(tenant_id, date).await
    }

    /// Deletes the day's record outright; the next send starts from zero.
    pub async fn reset(&self, tenant_id: Uuid, date: NaiveDate) -> Result<bool> {
        let existed = self.quota_repo.delete(tenant_id, date).await?;
        info!(%tenant_id, %date, existed, "quota: daily record reset");
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Stateful stand-in so the monotonicity properties can be exercised
    /// across calls.
    #[derive(Default)]
    struct InMemoryQuotaRepo {
        records: Mutex<HashMap<(Uuid, NaiveDate), (i64, BTreeSet<String>)>>,
    }

    #[async_trait]
    impl DailyQuotaRepository for InMemoryQuotaRepo {
        async fn find(
            &self,
            tenant_id: Uuid,
            date: NaiveDate,
        ) -> anyhow::Result<Option<DailyQuotaEntity>> {
            Ok(self.records.lock().unwrap().get(&(tenant_id, date)).map(
                |(sent_count, campaign_ids)| DailyQuotaEntity {
                    tenant_id,
                    date,
                    sent_count: *sent_count,
                    campaign_ids: campaign_ids.clone(),
                },
            ))
        }

        async fn increment_if_below(
            &self,
            tenant_id: Uuid,
            date: NaiveDate,
            campaign_id: &str,
            limit: i64,
        ) -> anyhow::Result<(bool, i64)> {
            let mut records = self.records.lock().unwrap();
            let entry = records
                .entry((tenant_id, date))
                .or_insert_with(|| (0, BTreeSet::new()));

            if entry.0 >= limit {
                return Ok((false, entry.0));
            }

            entry.0 += 1;
            entry.1.insert(campaign_id.to_string());
            Ok((true, entry.0))
        }

        async fn delete(&self, tenant_id: Uuid, date: NaiveDate) -> anyhow::Result<bool> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .remove(&(tenant_id, date))
                .is_some())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[tokio::test]
    async fn first_increment_creates_the_record_at_one() {
        // Scenario C: absent record, limit 100.
        let usecase = QuotaUseCase::new(Arc::new(InMemoryQuotaRepo::default()));
        let tenant_id = Uuid::new_v4();

        assert!(usecase.peek(tenant_id, day()).await.unwrap().is_none());

        let decision = usecase
            .check_and_increment(tenant_id, day(), "camp1", 100)
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.sent_count, 1);

        let record = usecase.peek(tenant_id, day()).await.unwrap().unwrap();
        assert_eq!(record.sent_count, 1);
        assert!(record.campaign_ids.contains("camp1"));
    }

    #[tokio::test]
    async fn sequential_increments_count_exactly() {
        let usecase = QuotaUseCase::new(Arc::new(InMemoryQuotaRepo::default()));
        let tenant_id = Uuid::new_v4();

        for expected in 1..=5 {
            let decision = usecase
                .check_and_increment(tenant_id, day(), "camp1", 100)
                .await
                .unwrap();
            assert_eq!(decision.sent_count, expected);
        }
    }

    #[tokio::test]
    async fn limit_denial_leaves_the_count_unchanged() {
        let usecase = QuotaUseCase::new(Arc::new(InMemoryQuotaRepo::default()));
        let tenant_id = Uuid::new_v4();

        for _ in 0..2 {
            usecase
                .check_and_increment(tenant_id, day(), "camp1", 2)
                .await
                .unwrap();
        }

        let denied = usecase
            .check_and_increment(tenant_id, day(), "camp1", 2)
            .await
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.sent_count, 2);

        let record = usecase.peek(tenant_id, day()).await.unwrap().unwrap();
        assert_eq!(record.sent_count, 2);
    }

    #[tokio::test]
    async fn reset_deletes_and_the_next_increment_starts_at_one() {
        let usecase = QuotaUseCase::new(Arc::new(InMemoryQuotaRepo::default()));
        let tenant_id = Uuid::new_v4();

        usecase
            .check_and_increment(tenant_id, day(), "camp1", 100)
            .await
            .unwrap();
        usecase
            .check_and_increment(tenant_id, day(), "camp1", 100)
            .await
            .unwrap();

        assert!(usecase.reset(tenant_id, day()).await.unwrap());
        assert!(usecase.peek(tenant_id, day()).await.unwrap().is_none());

        let decision = usecase
            .check_and_increment(tenant_id, day(), "camp2", 100)
            .await
            .unwrap();
        assert_eq!(decision.sent_count, 1);
    }

    #[tokio::test]
    async fn dates_are_independent_ledgers() {
        let usecase = QuotaUseCase::new(Arc::new(InMemoryQuotaRepo::default()));
        let tenant_id = Uuid::new_v4();
        let next_day = day().succ_opt().unwrap();

        usecase
            .check_and_increment(tenant_id, day(), "camp1", 100)
            .await
            .unwrap();

        let decision = usecase
            .check_and_increment(tenant_id, next_day, "camp1", 100)
            .await
            .unwrap();
        assert_eq!(decision.sent_count, 1);
    }
}
