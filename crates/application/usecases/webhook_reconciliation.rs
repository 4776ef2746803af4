use std::sync::Arc;

use anyhow::Result as AnyResult;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::usecases::feature_access::FeatureAccessUseCase;
use crate::domain::{
    entities::tenants::TenantEntity,
    repositories::{
        messaging::MessagingGateway, plans::PlanRepository, tenants::TenantRepository,
    },
    value_objects::{
        enums::feature_flags::FeatureFlag,
        webhooks::{WebhookCheck, WebhookSweepFailure, WebhookSweepSummary},
    },
};

/// Tenants reconciled concurrently per batch. Bounded to respect the
/// gateway's rate limits.
pub const RECONCILE_BATCH_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("tenant not found")]
    TenantNotFound,
    #[error("messaging gateway request failed")]
    GatewayUnavailable(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReconcileError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            ReconcileError::TenantNotFound => StatusCode::NOT_FOUND,
            ReconcileError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            ReconcileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

/// Keeps each tenant's gateway webhook consistent with its entitlement: the
/// automation callback URL when the effective plan grants the AI auto-reply,
/// nothing otherwise.
pub struct WebhookReconciliationUseCase<P, T, G>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    access: Arc<FeatureAccessUseCase<P>>,
    tenant_repo: Arc<T>,
    gateway: Arc<G>,
    automation_webhook_url: String,
}

impl<P, T, G> Clone for WebhookReconciliationUseCase<P, T, G>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            access: Arc::clone(&self.access),
            tenant_repo: Arc::clone(&self.tenant_repo),
            gateway: Arc::clone(&self.gateway),
            automation_webhook_url: self.automation_webhook_url.clone(),
        }
    }
}

impl<P, T, G> WebhookReconciliationUseCase<P, T, G>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    pub fn new(
        access: Arc<FeatureAccessUseCase<P>>,
        tenant_repo: Arc<T>,
        gateway: Arc<G>,
        automation_webhook_url: String,
    ) -> Self {
        Self {
            access,
            tenant_repo,
            gateway,
            automation_webhook_url,
        }
    }

    async fn required_url(&self, tenant: &TenantEntity) -> AnyResult<String> {
        let entitled = self
            .access
            .has_feature(tenant, FeatureFlag::AiAutoReply)
            .await?;
        if entitled {
            Ok(self.automation_webhook_url.clone())
        } else {
            Ok(String::new())
        }
    }

    pub async fn validate_tenant(&self, tenant: &TenantEntity) -> AnyResult<WebhookCheck> {
        if !tenant.whatsapp_connected || tenant.instance_token.is_empty() {
            return Ok(WebhookCheck::failed(
                tenant.id,
                "whatsapp instance not connected".to_string(),
            ));
        }

        let required_url = self.required_url(tenant).await?;
        let configured_url = tenant.webhook_configured.clone().unwrap_or_default();
        Ok(WebhookCheck::compared(tenant.id, configured_url, required_url))
    }

    pub async fn validate(&self, tenant_id: Uuid) -> ReconcileResult<WebhookCheck> {
        let tenant = self.load_tenant(tenant_id).await?;
        self.validate_tenant(&tenant)
            .await
            .map_err(ReconcileError::Internal)
    }

    /// Pushes the required URL to the gateway when the configured one has
    /// drifted, including clearing it on downgrade. Returns the post-fix
    /// check and whether a push happened. Gateway failures surface as
    /// `GatewayUnavailable`; the sweep collects them per tenant.
    pub async fn fix_tenant(
        &self,
        tenant: &TenantEntity,
    ) -> ReconcileResult<(WebhookCheck, bool)> {
        let check = self
            .validate_tenant(tenant)
            .await
            .map_err(ReconcileError::Internal)?;
        if check.error.is_some() || !check.needs_fix {
            return Ok((check, false));
        }

        if let Err(err) = self
            .gateway
            .set_webhook(&tenant.instance_token, &check.required_url)
            .await
        {
            error!(
                tenant_id = %tenant.id,
                error = ?err,
                "webhook_reconciliation: gateway rejected webhook update"
            );
            return Err(ReconcileError::GatewayUnavailable(err));
        }

        let stored = if check.required_url.is_empty() {
            None
        } else {
            Some(check.required_url.clone())
        };
        self.tenant_repo
            .update_webhook_configured(tenant.id, stored)
            .await
            .map_err(ReconcileError::Internal)?;

        info!(
            tenant_id = %tenant.id,
            cleared = check.required_url.is_empty(),
            "webhook_reconciliation: webhook reconfigured"
        );

        Ok((
            WebhookCheck::compared(tenant.id, check.required_url.clone(), check.required_url),
            true,
        ))
    }

    pub async fn fix(&self, tenant_id: Uuid) -> ReconcileResult<WebhookCheck> {
        let tenant = self.load_tenant(tenant_id).await?;
        let (check, _) = self.fix_tenant(&tenant).await?;
        Ok(check)
    }

    pub async fn validate_all(&self) -> ReconcileResult<WebhookSweepSummary> {
        self.sweep(false).await
    }

    pub async fn fix_all(&self) -> ReconcileResult<WebhookSweepSummary> {
        self.sweep(true).await
    }

    /// Bounded-concurrency sweep over every connected tenant. Per-tenant
    /// outcomes are collected independently; a failure never aborts the
    /// batch.
    async fn sweep(&self, apply_fix: bool) -> ReconcileResult<WebhookSweepSummary> {
        let tenants = self
            .tenant_repo
            .list_connected()
            .await
            .map_err(ReconcileError::Internal)?;

        let mut summary = WebhookSweepSummary::default();

        for chunk in tenants.chunks(RECONCILE_BATCH_SIZE) {
            let mut tasks = JoinSet::new();

            for tenant in chunk {
                let this = self.clone();
                let tenant = tenant.clone();
                tasks.spawn(async move {
                    let outcome = if apply_fix {
                        this.fix_tenant(&tenant).await
                    } else {
                        this.validate_tenant(&tenant)
                            .await
                            .map(|check| (check, false))
                            .map_err(ReconcileError::Internal)
                    };
                    (tenant.id, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((tenant_id, Ok((check, fixed)))) => {
                        summary.checked += 1;
                        if let Some(error) = check.error {
                            summary.failed += 1;
                            summary.failures.push(WebhookSweepFailure { tenant_id, error });
                        } else {
                            if check.is_valid {
                                summary.valid += 1;
                            }
                            if fixed {
                                summary.fixed += 1;
                            }
                        }
                    }
                    Ok((tenant_id, Err(err))) => {
                        error!(
                            %tenant_id,
                            error = ?err,
                            "webhook_reconciliation: tenant check failed"
                        );
                        summary.checked += 1;
                        summary.failed += 1;
                        summary.failures.push(WebhookSweepFailure {
                            tenant_id,
                            error: err.to_string(),
                        });
                    }
                    Err(join_err) => {
                        error!(
                            error = ?join_err,
                            "webhook_reconciliation: sweep task aborted"
                        );
                        summary.checked += 1;
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            checked = summary.checked,
            valid = summary.valid,
            fixed = summary.fixed,
            failed = summary.failed,
            apply_fix,
            "webhook_reconciliation: sweep completed"
        );

        Ok(summary)
    }

    async fn load_tenant(&self, tenant_id: Uuid) -> ReconcileResult<TenantEntity> {
        self.tenant_repo
            .find_by_id(tenant_id)
            .await
            .map_err(ReconcileError::Internal)?
            .ok_or(ReconcileError::TenantNotFound)
    }
}
