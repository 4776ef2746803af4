use std::{sync::Arc, time::Duration};

use anyhow::Result;
use crates::{
    application::usecases::webhook_reconciliation::WebhookReconciliationUseCase,
    domain::repositories::{
        messaging::MessagingGateway, plans::PlanRepository, tenants::TenantRepository,
    },
};
use tracing::{error, info};

/// Periodic out-of-band sweep: keeps every tenant's gateway webhook
/// converged with its entitlement even when nobody calls the on-demand
/// endpoints.
pub async fn run_reconcile_loop<P, T, G>(
    usecase: Arc<WebhookReconciliationUseCase<P, T, G>>,
    interval: Duration,
) -> Result<()>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    loop {
        info!("Running webhook reconciliation sweep...");
        match usecase.fix_all().await {
            Ok(summary) => {
                info!(
                    checked = summary.checked,
                    valid = summary.valid,
                    fixed = summary.fixed,
                    failed = summary.failed,
                    "Webhook reconciliation sweep finished"
                );
            }
            Err(e) => {
                error!("Error while running webhook reconciliation sweep: {}", e);
            }
        }

        tokio::time::sleep(interval).await;
    }
}
