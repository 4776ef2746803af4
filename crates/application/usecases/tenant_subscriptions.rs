use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::usecases::feature_access::FeatureAccessUseCase;
use crate::domain::{
    repositories::{plans::PlanRepository, tenants::TenantRepository},
    value_objects::plans::PlanFeatures,
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("tenant not found")]
    TenantNotFound,
    #[error("plan not found")]
    PlanNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            SubscriptionError::TenantNotFound | SubscriptionError::PlanNotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type SubscriptionResult<T> = std::result::Result<T, SubscriptionError>;

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStateDto {
    pub tenant_id: Uuid,
    pub declared_plan_id: Uuid,
    pub effective_plan_id: Uuid,
    pub effective_plan_name: Option<String>,
    pub access_expires_at: Option<chrono::DateTime<Utc>>,
    pub features: PlanFeatures,
}

/// Tenant subscription state transitions: payment confirmation and admin
/// override both assign a plan and recompute the expiry from its duration.
pub struct TenantSubscriptionUseCase<P, T>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    tenant_repo: Arc<T>,
    access: Arc<FeatureAccessUseCase<P>>,
}

impl<P, T> TenantSubscriptionUseCase<P, T>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        tenant_repo: Arc<T>,
        access: Arc<FeatureAccessUseCase<P>>,
    ) -> Self {
        Self {
            plan_repo,
            tenant_repo,
            access,
        }
    }

    /// Assigns a plan and computes `access_expires_at = now + duration`,
    /// or NULL for a non-expiring plan (`duration_days == 0`).
    pub async fn assign_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> SubscriptionResult<()> {
        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "tenant_subscriptions: failed to load plan");
                SubscriptionError::Internal(err)
            })?
            .ok_or(SubscriptionError::PlanNotFound)?;

        let access_expires_at = if plan.duration_days == 0 {
            None
        } else {
            Some(Utc::now() + Duration::days(plan.duration_days.into()))
        };

        self.tenant_repo
            .assign_plan(tenant_id, plan_id, access_expires_at)
            .await
            .map_err(|err| {
                error!(
                    %tenant_id,
                    %plan_id,
                    db_error = ?err,
                    "tenant_subscriptions: failed to assign plan"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(
            %tenant_id,
            %plan_id,
            expires_at = ?access_expires_at,
            "tenant_subscriptions: plan assigned"
        );

        Ok(())
    }

    pub async fn subscription_state(
        &self,
        tenant_id: Uuid,
    ) -> SubscriptionResult<SubscriptionStateDto> {
        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await
            .map_err(SubscriptionError::Internal)?
            .ok_or(SubscriptionError::TenantNotFound)?;

        let effective = self
            .access
            .effective_plan(&tenant)
            .await
            .map_err(SubscriptionError::Internal)?;

        Ok(SubscriptionStateDto {
            tenant_id: tenant.id,
            declared_plan_id: tenant.plan_id,
            effective_plan_id: effective.id,
            effective_plan_name: effective.name.clone(),
            access_expires_at: tenant.access_expires_at,
            features: effective.features,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::{
        entities::plans::PlanEntity,
        repositories::{plans::MockPlanRepository, tenants::MockTenantRepository},
        value_objects::{
            enums::plan_statuses::PlanStatus,
            plans::{FREE_PLAN_ID, PlanFeatures},
        },
    };

    fn plan(id: Uuid, duration_days: i32) -> PlanEntity {
        PlanEntity {
            id,
            name: Some("Plan".to_string()),
            description: None,
            price_minor: 9990,
            duration_days,
            features: PlanFeatures::default(),
            is_featured: false,
            status: PlanStatus::Active,
        }
    }

    #[tokio::test]
    async fn paid_plan_assignment_sets_a_future_expiry() {
        let plan_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let thirty_day = plan(plan_id, 30);
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = thirty_day.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let mut tenant_repo = MockTenantRepository::new();
        tenant_repo
            .expect_assign_plan()
            .withf(move |tid, pid, expires| {
                *tid == tenant_id
                    && *pid == plan_id
                    && expires.is_some_and(|at| at > Utc::now() + Duration::days(29))
            })
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let plan_repo = Arc::new(plan_repo);
        let usecase = TenantSubscriptionUseCase::new(
            Arc::clone(&plan_repo),
            Arc::new(tenant_repo),
            Arc::new(FeatureAccessUseCase::new(plan_repo)),
        );

        usecase.assign_plan(tenant_id, plan_id).await.unwrap();
    }

    #[tokio::test]
    async fn free_plan_assignment_clears_the_expiry() {
        let tenant_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let free = plan(FREE_PLAN_ID, 0);
        plan_repo
            .expect_find_by_id()
            .with(eq(FREE_PLAN_ID))
            .returning(move |_| {
                let plan = free.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let mut tenant_repo = MockTenantRepository::new();
        tenant_repo
            .expect_assign_plan()
            .with(eq(tenant_id), eq(FREE_PLAN_ID), eq(None))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let plan_repo = Arc::new(plan_repo);
        let usecase = TenantSubscriptionUseCase::new(
            Arc::clone(&plan_repo),
            Arc::new(tenant_repo),
            Arc::new(FeatureAccessUseCase::new(plan_repo)),
        );

        usecase.assign_plan(tenant_id, FREE_PLAN_ID).await.unwrap();
    }

    #[tokio::test]
    async fn assigning_an_unknown_plan_is_not_found() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let plan_repo = Arc::new(plan_repo);
        let usecase = TenantSubscriptionUseCase::new(
            Arc::clone(&plan_repo),
            Arc::new(MockTenantRepository::new()),
            Arc::new(FeatureAccessUseCase::new(plan_repo)),
        );

        let err = usecase
            .assign_plan(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
    }
}
