use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    entities::plans::PlanEntity,
    repositories::plans::PlanRepository,
    value_objects::{
        enums::{feature_flags::FeatureFlag, plan_statuses::PlanStatus},
        plans::{FREE_PLAN_ID, LEGACY_TRIAL_PLAN_ID, PlanFeatures},
    },
};

pub const STARTER_PLAN_ID: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_0000b0b50001);
pub const PROFESSIONAL_PLAN_ID: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_0000b0b50002);
pub const PREMIUM_PLAN_ID: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_0000b0b50003);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("plan not found")]
    PlanNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            CatalogError::PlanNotFound => StatusCode::NOT_FOUND,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSyncReport {
    pub synced: usize,
    pub removed_deprecated: bool,
}

/// The free plan as shipped with the product. Used both as the sync seed and
/// as the last-resort fallback when the catalog row is missing.
pub fn free_plan_definition() -> PlanEntity {
    PlanEntity {
        id: FREE_PLAN_ID,
        name: Some("Free".to_string()),
        description: Some("Manual scheduling with manager notifications".to_string()),
        price_minor: 0,
        duration_days: 0,
        features: PlanFeatures {
            flags: [FeatureFlag::ManagerNotification].into_iter().collect(),
            daily_message_limit: Some(30),
        },
        is_featured: false,
        status: PlanStatus::Active,
    }
}

/// Fixed reference catalog applied by `sync_plans`. Order matters only for
/// readability; the customer-facing listing sorts by price in the store.
pub fn reference_plans() -> Vec<PlanEntity> {
    vec![
        free_plan_definition(),
        PlanEntity {
            id: STARTER_PLAN_ID,
            name: Some("Starter".to_string()),
            description: Some("Appointment reminders over WhatsApp".to_string()),
            price_minor: 4990,
            duration_days: 30,
            features: PlanFeatures {
                flags: [
                    FeatureFlag::ManagerNotification,
                    FeatureFlag::Reminder24h,
                    FeatureFlag::Reminder2h,
                ]
                .into_iter()
                .collect(),
                daily_message_limit: Some(200),
            },
            is_featured: false,
            status: PlanStatus::Active,
        },
        PlanEntity {
            id: PROFESSIONAL_PLAN_ID,
            name: Some("Professional".to_string()),
            description: Some("Campaigns, feedback and birthday automations".to_string()),
            price_minor: 9990,
            duration_days: 30,
            features: PlanFeatures {
                flags: [
                    FeatureFlag::ManagerNotification,
                    FeatureFlag::Reminder24h,
                    FeatureFlag::Reminder2h,
                    FeatureFlag::PostVisitFeedback,
                    FeatureFlag::BirthdayReminder,
                    FeatureFlag::BulkMessaging,
                ]
                .into_iter()
                .collect(),
                daily_message_limit: Some(1000),
            },
            is_featured: true,
            status: PlanStatus::Active,
        },
        PlanEntity {
            id: PREMIUM_PLAN_ID,
            name: Some("Premium".to_string()),
            description: Some("Full automation including the AI receptionist".to_string()),
            price_minor: 19990,
            duration_days: 30,
            features: PlanFeatures {
                flags: [
                    FeatureFlag::ManagerNotification,
                    FeatureFlag::Reminder24h,
                    FeatureFlag::Reminder2h,
                    FeatureFlag::PostVisitFeedback,
                    FeatureFlag::BirthdayReminder,
                    FeatureFlag::BulkMessaging,
                    FeatureFlag::AiAutoReply,
                    FeatureFlag::EscalationToHuman,
                    FeatureFlag::CallRejection,
                ]
                .into_iter()
                .collect(),
                daily_message_limit: Some(5000),
            },
            is_featured: false,
            status: PlanStatus::Active,
        },
    ]
}

pub struct PlanCatalogUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> PlanCatalogUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> CatalogResult<PlanEntity> {
        self.plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plan_catalog: failed to load plan");
                CatalogError::Internal(err)
            })?
            .ok_or(CatalogError::PlanNotFound)
    }

    pub async fn list_paid_plans(&self) -> CatalogResult<Vec<PlanEntity>> {
        let plans = self.plan_repo.list_paid_plans().await.map_err(|err| {
            error!(db_error = ?err, "plan_catalog: failed to list paid plans");
            CatalogError::Internal(err)
        })?;
        info!(plan_count = plans.len(), "plan_catalog: paid plans loaded");
        Ok(plans)
    }

    /// Overwrites the catalog with the reference definitions. Merge-only:
    /// plans outside the reference set survive, except the deprecated legacy
    /// trial plan which is deleted when present. Safe to run repeatedly.
    pub async fn sync_plans(&self) -> CatalogResult<CatalogSyncReport> {
        let reference = reference_plans();
        let synced = reference.len();

        for plan in reference {
            let plan_id = plan.id;
            self.plan_repo.upsert_plan(plan).await.map_err(|err| {
                error!(%plan_id, db_error = ?err, "plan_catalog: failed to upsert reference plan");
                CatalogError::Internal(err)
            })?;
        }

        let removed_deprecated = self
            .plan_repo
            .delete_plan(LEGACY_TRIAL_PLAN_ID)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plan_catalog: failed to delete deprecated plan");
                CatalogError::Internal(err)
            })?;

        info!(
            synced,
            removed_deprecated, "plan_catalog: reference catalog synced"
        );

        Ok(CatalogSyncReport {
            synced,
            removed_deprecated,
        })
    }
}
