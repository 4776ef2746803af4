use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::usecases::{feature_access::FeatureAccessUseCase, quota::QuotaUseCase};
use crate::domain::{
    entities::tenants::TenantEntity,
    repositories::{
        daily_quota::DailyQuotaRepository, messaging::MessagingGateway, plans::PlanRepository,
    },
    value_objects::{
        access::DenialReason, enums::feature_flags::FeatureFlag, phone::PhoneNumber,
    },
};

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("feature not available: {0}")]
    FeatureDenied(DenialReason),
    #[error("whatsapp instance not connected")]
    NotConnected,
    #[error("invalid recipient phone number: {0}")]
    InvalidRecipient(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            CampaignError::FeatureDenied(_) => StatusCode::FORBIDDEN,
            CampaignError::NotConnected => StatusCode::BAD_REQUEST,
            CampaignError::InvalidRecipient(_) => StatusCode::BAD_REQUEST,
            CampaignError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CampaignResult<T> = std::result::Result<T, CampaignError>;

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub requested: usize,
    pub sent: usize,
    pub denied_quota: usize,
    pub failed: usize,
}

/// Bulk messaging: the full privileged path. Entitlement first, then every
/// single send passes through the quota ledger, then the gateway. Gateway
/// failures are counted per recipient and never abort the campaign.
pub struct CampaignUseCase<P, Q, G>
where
    P: PlanRepository + Send + Sync + 'static,
    Q: DailyQuotaRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    access: Arc<FeatureAccessUseCase<P>>,
    quota: Arc<QuotaUseCase<Q>>,
    gateway: Arc<G>,
}

impl<P, Q, G> CampaignUseCase<P, Q, G>
where
    P: PlanRepository + Send + Sync + 'static,
    Q: DailyQuotaRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    pub fn new(
        access: Arc<FeatureAccessUseCase<P>>,
        quota: Arc<QuotaUseCase<Q>>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            access,
            quota,
            gateway,
        }
    }

    /// `date` is pinned by the caller when the campaign starts, so a long
    /// run that crosses midnight stays on one quota day.
    pub async fn send_bulk(
        &self,
        tenant: &TenantEntity,
        date: NaiveDate,
        campaign_id: &str,
        recipients: &[String],
        text: &str,
    ) -> CampaignResult<CampaignSummary> {
        let decision = self
            .access
            .can_use_feature(tenant, FeatureFlag::BulkMessaging)
            .await
            .map_err(CampaignError::Internal)?;
        if !decision.allowed {
            let reason = decision.reason.unwrap_or(DenialReason::PlanLacksFeature);
            warn!(
                tenant_id = %tenant.id,
                campaign_id,
                %reason,
                "campaigns: bulk messaging denied"
            );
            return Err(CampaignError::FeatureDenied(reason));
        }

        if !tenant.whatsapp_connected || tenant.instance_token.is_empty() {
            return Err(CampaignError::NotConnected);
        }

        // Validate the whole list before the first send.
        let mut phones = Vec::with_capacity(recipients.len());
        for raw in recipients {
            let phone = PhoneNumber::parse(raw)
                .map_err(|_| CampaignError::InvalidRecipient(raw.clone()))?;
            phones.push(phone);
        }

        let limit = self
            .access
            .effective_plan(tenant)
            .await
            .map_err(CampaignError::Internal)?
            .features
            .daily_message_limit_or_default();

        let mut summary = CampaignSummary {
            campaign_id: campaign_id.to_string(),
            requested: phones.len(),
            sent: 0,
            denied_quota: 0,
            failed: 0,
        };

        for phone in &phones {
            let quota_decision = self
                .quota
                .check_and_increment(tenant.id, date, campaign_id, limit)
                .await
                .map_err(CampaignError::Internal)?;

            if !quota_decision.allowed {
                summary.denied_quota += 1;
                continue;
            }

            match self
                .gateway
                .send_text(&tenant.instance_token, phone.as_str(), text)
                .await
            {
                Ok(()) => summary.sent += 1,
                Err(err) => {
                    error!(
                        tenant_id = %tenant.id,
                        campaign_id,
                        error = ?err,
                        "campaigns: gateway send failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            tenant_id = %tenant.id,
            campaign_id,
            requested = summary.requested,
            sent = summary.sent,
            denied_quota = summary.denied_quota,
            failed = summary.failed,
            "campaigns: bulk send completed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{
        entities::plans::PlanEntity,
        repositories::{
            daily_quota::MockDailyQuotaRepository, messaging::MockMessagingGateway,
            plans::MockPlanRepository,
        },
        value_objects::{
            enums::plan_statuses::PlanStatus,
            plans::{FREE_PLAN_ID, PlanFeatures},
        },
    };

    fn plan(id: Uuid, flags: &[FeatureFlag], limit: Option<i64>) -> PlanEntity {
        PlanEntity {
            id,
            name: Some("Plan".to_string()),
            description: None,
            price_minor: 9990,
            duration_days: 30,
            features: PlanFeatures {
                flags: flags.iter().copied().collect(),
                daily_message_limit: limit,
            },
            is_featured: false,
            status: PlanStatus::Active,
        }
    }

    fn tenant(plan_id: Uuid) -> TenantEntity {
        let now = Utc::now();
        TenantEntity {
            id: Uuid::new_v4(),
            business_name: "Barber Shop".to_string(),
            plan_id,
            access_expires_at: None,
            whatsapp_connected: true,
            instance_token: "tok-1".to_string(),
            webhook_configured: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn plan_repo_with(plans: Vec<PlanEntity>) -> MockPlanRepository {
        let mut repo = MockPlanRepository::new();
        repo.expect_find_by_id().returning(move |id| {
            let found = plans.iter().find(|p| p.id == id).cloned();
            Box::pin(async move { Ok(found) })
        });
        repo
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn usecase(
        plan_repo: MockPlanRepository,
        quota_repo: MockDailyQuotaRepository,
        gateway: MockMessagingGateway,
    ) -> CampaignUseCase<MockPlanRepository, MockDailyQuotaRepository, MockMessagingGateway> {
        CampaignUseCase::new(
            Arc::new(FeatureAccessUseCase::new(Arc::new(plan_repo))),
            Arc::new(QuotaUseCase::new(Arc::new(quota_repo))),
            Arc::new(gateway),
        )
    }

    #[tokio::test]
    async fn denies_without_bulk_messaging_feature() {
        let free = plan(FREE_PLAN_ID, &[FeatureFlag::ManagerNotification], None);
        let tenant = tenant(FREE_PLAN_ID);

        let usecase = usecase(
            plan_repo_with(vec![free]),
            MockDailyQuotaRepository::new(),
            MockMessagingGateway::new(),
        );

        let err = usecase
            .send_bulk(&tenant, day(), "camp1", &["5511912345678".to_string()], "hi")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CampaignError::FeatureDenied(DenialReason::PlanLacksFeature)
        ));
        assert_eq!(err.status_code(), http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn rejects_malformed_recipient_before_sending() {
        let pro = plan(Uuid::new_v4(), &[FeatureFlag::BulkMessaging], Some(100));
        let tenant = tenant(pro.id);

        let usecase = usecase(
            plan_repo_with(vec![pro]),
            MockDailyQuotaRepository::new(),
            MockMessagingGateway::new(),
        );

        let err = usecase
            .send_bulk(
                &tenant,
                day(),
                "camp1",
                &["5511912345678".to_string(), "not-a-phone".to_string()],
                "hi",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CampaignError::InvalidRecipient(_)));
    }

    #[tokio::test]
    async fn quota_exhaustion_skips_sends_without_failing_the_campaign() {
        let pro = plan(Uuid::new_v4(), &[FeatureFlag::BulkMessaging], Some(2));
        let tenant = tenant(pro.id);
        let tenant_id = tenant.id;

        let mut quota_repo = MockDailyQuotaRepository::new();
        let mut calls = 0;
        quota_repo
            .expect_increment_if_below()
            .with(eq(tenant_id), eq(day()), eq("camp1"), eq(2))
            .returning(move |_, _, _, limit| {
                calls += 1;
                let count = calls.min(limit);
                let allowed = calls <= limit;
                Box::pin(async move { Ok((allowed, count)) })
            });

        let mut gateway = MockMessagingGateway::new();
        gateway
            .expect_send_text()
            .times(2)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = usecase(plan_repo_with(vec![pro]), quota_repo, gateway);

        let recipients = vec![
            "5511912345671".to_string(),
            "5511912345672".to_string(),
            "5511912345673".to_string(),
        ];
        let summary = usecase
            .send_bulk(&tenant, day(), "camp1", &recipients, "hi")
            .await
            .unwrap();

        assert_eq!(summary.sent, 2);
        assert_eq!(summary.denied_quota, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn gateway_failure_counts_the_recipient_and_continues() {
        let pro = plan(Uuid::new_v4(), &[FeatureFlag::BulkMessaging], Some(100));
        let tenant = tenant(pro.id);

        let mut quota_repo = MockDailyQuotaRepository::new();
        let mut count = 0;
        quota_repo
            .expect_increment_if_below()
            .returning(move |_, _, _, _| {
                count += 1;
                let current = count;
                Box::pin(async move { Ok((true, current)) })
            });

        let mut gateway = MockMessagingGateway::new();
        gateway
            .expect_send_text()
            .with(eq("tok-1"), eq("5511912345671"), eq("hi"))
            .returning(|_, _, _| Box::pin(async { Err(anyhow::anyhow!("gateway 500")) }));
        gateway
            .expect_send_text()
            .with(eq("tok-1"), eq("5511912345672"), eq("hi"))
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = usecase(plan_repo_with(vec![pro]), quota_repo, gateway);

        let recipients = vec![
            "5511912345671".to_string(),
            "5511912345672".to_string(),
        ];
        let summary = usecase
            .send_bulk(&tenant, day(), "camp1", &recipients, "hi")
            .await
            .unwrap();

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
    }
}
