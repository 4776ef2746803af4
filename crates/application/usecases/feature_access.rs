use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::usecases::plan_catalog::free_plan_definition;
use crate::domain::{
    entities::{plans::PlanEntity, tenants::TenantEntity},
    repositories::plans::PlanRepository,
    value_objects::{
        access::{AccessDecision, DenialReason},
        enums::feature_flags::FeatureFlag,
        plans::FREE_PLAN_ID,
    },
};

/// Resolves the plan a tenant is actually entitled to and answers feature
/// checks against it. Missing or expired state degrades to the free plan;
/// this never fails open to a paid plan.
pub struct FeatureAccessUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> FeatureAccessUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    /// The expiry rule. The free plan is structurally exempt: a stray
    /// `access_expires_at` on a free-plan tenant can never expire it.
    /// Returns the effective plan id and whether expiry forced a fallback.
    fn effective_plan_id(tenant: &TenantEntity, now: DateTime<Utc>) -> (Uuid, bool) {
        if tenant.plan_id == FREE_PLAN_ID {
            return (FREE_PLAN_ID, false);
        }

        match tenant.access_expires_at {
            None => (tenant.plan_id, false),
            Some(expires_at) if expires_at > now => (tenant.plan_id, false),
            Some(_) => (FREE_PLAN_ID, true),
        }
    }

    async fn resolve_plan_or_free(&self, plan_id: Uuid) -> Result<PlanEntity> {
        if let Some(plan) = self.plan_repo.find_by_id(plan_id).await? {
            return Ok(plan);
        }

        if plan_id != FREE_PLAN_ID {
            debug!(
                %plan_id,
                "feature_access: plan missing from catalog, downgrading to free plan"
            );
            if let Some(free) = self.plan_repo.find_by_id(FREE_PLAN_ID).await? {
                return Ok(free);
            }
        }

        warn!("feature_access: free plan missing from catalog, using built-in definition");
        Ok(free_plan_definition())
    }

    /// The plan applied after expiry fallback and catalog resolution.
    pub async fn effective_plan(&self, tenant: &TenantEntity) -> Result<PlanEntity> {
        let (effective_id, expired) = Self::effective_plan_id(tenant, Utc::now());
        if expired {
            debug!(
                tenant_id = %tenant.id,
                declared_plan_id = %tenant.plan_id,
                "feature_access: access expired, falling back to free plan"
            );
        }
        self.resolve_plan_or_free(effective_id).await
    }

    pub async fn has_feature(&self, tenant: &TenantEntity, flag: FeatureFlag) -> Result<bool> {
        Ok(self.can_use_feature(tenant, flag).await?.allowed)
    }

    /// Like `has_feature` but carries the denial reason: `AccessExpired`
    /// only when renewing would actually restore the feature.
    pub async fn can_use_feature(
        &self,
        tenant: &TenantEntity,
        flag: FeatureFlag,
    ) -> Result<AccessDecision> {
        let (effective_id, expired) = Self::effective_plan_id(tenant, Utc::now());
        let plan = self.resolve_plan_or_free(effective_id).await?;

        if plan.features.has(flag) {
            return Ok(AccessDecision::granted());
        }

        if expired {
            let declared = self.plan_repo.find_by_id(tenant.plan_id).await?;
            if declared.is_some_and(|p| p.features.has(flag)) {
                return Ok(AccessDecision::denied(DenialReason::AccessExpired));
            }
        }

        Ok(AccessDecision::denied(DenialReason::PlanLacksFeature))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use mockall::predicate::eq;

    use super::*;
    use crate::application::usecases::plan_catalog::PROFESSIONAL_PLAN_ID;
    use crate::domain::{
        repositories::plans::MockPlanRepository,
        value_objects::{enums::plan_statuses::PlanStatus, plans::PlanFeatures},
    };

    fn plan(id: Uuid, flags: &[FeatureFlag]) -> PlanEntity {
        PlanEntity {
            id,
            name: Some("Plan".to_string()),
            description: None,
            price_minor: if id == FREE_PLAN_ID { 0 } else { 9990 },
            duration_days: if id == FREE_PLAN_ID { 0 } else { 30 },
            features: PlanFeatures {
                flags: flags.iter().copied().collect(),
                daily_message_limit: None,
            },
            is_featured: false,
            status: PlanStatus::Active,
        }
    }

    fn tenant(plan_id: Uuid, access_expires_at: Option<DateTime<Utc>>) -> TenantEntity {
        let now = Utc::now();
        TenantEntity {
            id: Uuid::new_v4(),
            business_name: "Bela Vista Salon".to_string(),
            plan_id,
            access_expires_at,
            whatsapp_connected: true,
            instance_token: "instance-token".to_string(),
            webhook_configured: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn expect_plan(repo: &mut MockPlanRepository, id: Uuid, result: Option<PlanEntity>) {
        repo.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| {
                let result = result.clone();
                Box::pin(async move { Ok(result) })
            });
    }

    #[tokio::test]
    async fn free_plan_tenant_lacking_feature_gets_plan_lacks_reason() {
        // Scenario A: free plan with manager notifications only.
        let mut repo = MockPlanRepository::new();
        expect_plan(
            &mut repo,
            FREE_PLAN_ID,
            Some(plan(FREE_PLAN_ID, &[FeatureFlag::ManagerNotification])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(FREE_PLAN_ID, None);

        let decision = usecase
            .can_use_feature(&tenant, FeatureFlag::BulkMessaging)
            .await
            .unwrap();

        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenialReason::PlanLacksFeature));
    }

    #[tokio::test]
    async fn expired_professional_tenant_gets_access_expired_reason() {
        // Scenario B: Professional plan, expired yesterday.
        let mut repo = MockPlanRepository::new();
        expect_plan(
            &mut repo,
            FREE_PLAN_ID,
            Some(plan(FREE_PLAN_ID, &[FeatureFlag::ManagerNotification])),
        );
        expect_plan(
            &mut repo,
            PROFESSIONAL_PLAN_ID,
            Some(plan(PROFESSIONAL_PLAN_ID, &[FeatureFlag::BulkMessaging])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(
            PROFESSIONAL_PLAN_ID,
            Some(Utc::now() - Duration::days(1)),
        );

        let decision = usecase
            .can_use_feature(&tenant, FeatureFlag::BulkMessaging)
            .await
            .unwrap();

        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenialReason::AccessExpired));
    }

    #[tokio::test]
    async fn unexpired_paid_plan_grants_its_features() {
        let mut repo = MockPlanRepository::new();
        expect_plan(
            &mut repo,
            PROFESSIONAL_PLAN_ID,
            Some(plan(PROFESSIONAL_PLAN_ID, &[FeatureFlag::BulkMessaging])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(
            PROFESSIONAL_PLAN_ID,
            Some(Utc::now() + Duration::days(10)),
        );

        assert!(usecase
            .has_feature(&tenant, FeatureFlag::BulkMessaging)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn null_expiry_means_permanently_valid() {
        let mut repo = MockPlanRepository::new();
        expect_plan(
            &mut repo,
            PROFESSIONAL_PLAN_ID,
            Some(plan(PROFESSIONAL_PLAN_ID, &[FeatureFlag::BulkMessaging])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(PROFESSIONAL_PLAN_ID, None);

        assert!(usecase
            .has_feature(&tenant, FeatureFlag::BulkMessaging)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unresolvable_plan_behaves_like_free_plan() {
        let ghost_plan_id = Uuid::new_v4();
        let mut repo = MockPlanRepository::new();
        expect_plan(&mut repo, ghost_plan_id, None);
        expect_plan(
            &mut repo,
            FREE_PLAN_ID,
            Some(plan(FREE_PLAN_ID, &[FeatureFlag::ManagerNotification])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(ghost_plan_id, None);

        let decision = usecase
            .can_use_feature(&tenant, FeatureFlag::BulkMessaging)
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenialReason::PlanLacksFeature));

        assert!(usecase
            .has_feature(&tenant, FeatureFlag::ManagerNotification)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn free_plan_is_structurally_exempt_from_expiry() {
        let mut repo = MockPlanRepository::new();
        expect_plan(
            &mut repo,
            FREE_PLAN_ID,
            Some(plan(FREE_PLAN_ID, &[FeatureFlag::ManagerNotification])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        // A data bug set an expiry on a free-plan tenant; it must not matter.
        let tenant = tenant(FREE_PLAN_ID, Some(Utc::now() - Duration::days(30)));

        assert!(usecase
            .has_feature(&tenant, FeatureFlag::ManagerNotification)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn missing_free_plan_row_falls_back_to_builtin_definition() {
        let mut repo = MockPlanRepository::new();
        expect_plan(&mut repo, FREE_PLAN_ID, None);

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(FREE_PLAN_ID, None);

        // The built-in free definition still grants manager notifications.
        assert!(usecase
            .has_feature(&tenant, FeatureFlag::ManagerNotification)
            .await
            .unwrap());
        assert!(!usecase
            .has_feature(&tenant, FeatureFlag::AiAutoReply)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_tenant_whose_plan_never_had_the_feature_gets_upgrade_reason() {
        let mut repo = MockPlanRepository::new();
        expect_plan(
            &mut repo,
            FREE_PLAN_ID,
            Some(plan(FREE_PLAN_ID, &[FeatureFlag::ManagerNotification])),
        );
        expect_plan(
            &mut repo,
            PROFESSIONAL_PLAN_ID,
            Some(plan(PROFESSIONAL_PLAN_ID, &[FeatureFlag::BulkMessaging])),
        );

        let usecase = FeatureAccessUseCase::new(Arc::new(repo));
        let tenant = tenant(
            PROFESSIONAL_PLAN_ID,
            Some(Utc::now() - Duration::days(1)),
        );

        // Renewing Professional would not grant the AI receptionist, so the
        // denial is "plan lacks feature", not "access expired".
        let decision = usecase
            .can_use_feature(&tenant, FeatureFlag::AiAutoReply)
            .await
            .unwrap();
        assert_eq!(decision.reason, Some(DenialReason::PlanLacksFeature));
    }
}
