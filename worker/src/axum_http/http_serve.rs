use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use crates::{
    application::usecases::webhook_reconciliation::WebhookReconciliationUseCase,
    gateway::whatsapp_client::WhatsAppClient,
    infra::db::repositories::{
        contacts::ContactPostgres, daily_quota::DailyQuotaPostgres, plans::PlanPostgres,
        tenants::TenantPostgres,
    },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    jobs::reminders::ReminderJobs,
};

type Jobs = ReminderJobs<
    PlanPostgres,
    TenantPostgres,
    DailyQuotaPostgres,
    ContactPostgres,
    WhatsAppClient,
>;
type Reconciliation = WebhookReconciliationUseCase<PlanPostgres, TenantPostgres, WhatsAppClient>;

pub async fn start(
    config: Arc<DotEnvyConfig>,
    jobs: Arc<Jobs>,
    reconciliation: Arc<Reconciliation>,
) -> Result<()> {
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/internal/v1/jobs",
            routers::jobs::routes(Arc::clone(&config), jobs, reconciliation),
        )
        .route(
            "/internal/v1/health-check",
            get(default_routers::health_check),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Worker server is running on port {}", config.worker_server.port);
    axum::serve(listener, app).await?;

    Ok(())
}
