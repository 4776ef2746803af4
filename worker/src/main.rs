use std::{sync::Arc, time::Duration};

use anyhow::Result;
use crates::{
    application::usecases::{
        feature_access::FeatureAccessUseCase, quota::QuotaUseCase,
        webhook_reconciliation::WebhookReconciliationUseCase,
    },
    gateway::whatsapp_client::WhatsAppClient,
    infra::db::{
        postgres::postgres_connection,
        repositories::{
            contacts::ContactPostgres, daily_quota::DailyQuotaPostgres, plans::PlanPostgres,
            tenants::TenantPostgres,
        },
    },
};
use tracing::{error, info};
use worker::{axum_http, config, jobs::reminders::ReminderJobs, services::reconcile_loop};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    // Repositories over the shared DB pool
    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool_arc)));
    let tenant_repo = Arc::new(TenantPostgres::new(Arc::clone(&db_pool_arc)));
    let quota_repo = Arc::new(DailyQuotaPostgres::new(Arc::clone(&db_pool_arc)));
    let contact_repo = Arc::new(ContactPostgres::new(Arc::clone(&db_pool_arc)));

    let gateway = Arc::new(WhatsAppClient::new(
        dotenvy_env.whatsapp.api_base_url.clone(),
    )?);

    let access = Arc::new(FeatureAccessUseCase::new(Arc::clone(&plan_repo)));

    let reminder_jobs = Arc::new(ReminderJobs::new(
        Arc::clone(&access),
        Arc::clone(&tenant_repo),
        Arc::new(QuotaUseCase::new(quota_repo)),
        contact_repo,
        Arc::clone(&gateway),
    ));

    let reconciliation = Arc::new(WebhookReconciliationUseCase::new(
        access,
        tenant_repo,
        gateway,
        dotenvy_env.whatsapp.automation_webhook_url.clone(),
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let server_reconciliation = Arc::clone(&reconciliation);
    let job_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, reminder_jobs, server_reconciliation).await
    });

    let interval = Duration::from_secs(dotenvy_env.cron.reconcile_interval_secs);
    let reconcile_sweep = tokio::spawn(reconcile_loop::run_reconcile_loop(
        reconciliation,
        interval,
    ));

    tokio::select! {
        result = job_server => result??,
        result = reconcile_sweep => result??,
    };
    Ok(())
}
