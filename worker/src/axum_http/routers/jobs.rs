use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{NaiveDate, Utc};
use crates::{
    application::usecases::webhook_reconciliation::WebhookReconciliationUseCase,
    gateway::whatsapp_client::WhatsAppClient,
    infra::db::repositories::{
        contacts::ContactPostgres, daily_quota::DailyQuotaPostgres, plans::PlanPostgres,
        tenants::TenantPostgres,
    },
};
use serde::Deserialize;
use tracing::error;

use crate::{
    config::config_model::DotEnvyConfig,
    jobs::reminders::{ReminderJobs, ReminderKind},
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/jobs/birthday-reminders" \
//     -H "Authorization: Bearer $CRON_SECRET" \
//     -H "Content-Type: application/json" \
//     -d '{"date":"2025-01-10"}'

type Jobs = ReminderJobs<
    PlanPostgres,
    TenantPostgres,
    DailyQuotaPostgres,
    ContactPostgres,
    WhatsAppClient,
>;
type Reconciliation = WebhookReconciliationUseCase<PlanPostgres, TenantPostgres, WhatsAppClient>;

#[derive(Clone)]
pub struct JobsRouteState {
    config: Arc<DotEnvyConfig>,
    jobs: Arc<Jobs>,
    reconciliation: Arc<Reconciliation>,
}

pub fn routes(
    config: Arc<DotEnvyConfig>,
    jobs: Arc<Jobs>,
    reconciliation: Arc<Reconciliation>,
) -> Router {
    Router::new()
        .route("/birthday-reminders", post(run_birthday_reminders))
        .route("/return-reminders", post(run_return_reminders))
        .route("/reconcile-webhooks", post(reconcile_webhooks))
        .with_state(JobsRouteState {
            config,
            jobs,
            reconciliation,
        })
}

#[derive(Debug, Default, Deserialize)]
pub struct RunJobRequest {
    /// Quota day for the run; defaults to today. Pinned once so the whole
    /// run charges a single ledger day.
    pub date: Option<NaiveDate>,
}

pub async fn run_birthday_reminders(
    State(state): State<JobsRouteState>,
    headers: HeaderMap,
    payload: Option<Json<RunJobRequest>>,
) -> Response {
    run_reminder_job(state, headers, payload, ReminderKind::Birthday).await
}

pub async fn run_return_reminders(
    State(state): State<JobsRouteState>,
    headers: HeaderMap,
    payload: Option<Json<RunJobRequest>>,
) -> Response {
    run_reminder_job(state, headers, payload, ReminderKind::ReturnVisit).await
}

async fn run_reminder_job(
    state: JobsRouteState,
    headers: HeaderMap,
    payload: Option<Json<RunJobRequest>>,
    kind: ReminderKind,
) -> Response {
    if let Err(status) = authorize_bearer(&headers, &state.config.cron.secret) {
        return (status, "unauthorized").into_response();
    }

    let date = payload
        .and_then(|Json(body)| body.date)
        .unwrap_or_else(|| Utc::now().date_naive());

    match state.jobs.run(kind, date).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => {
            error!(error = ?err, "jobs: reminder job failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "job failed").into_response()
        }
    }
}

pub async fn reconcile_webhooks(
    State(state): State<JobsRouteState>,
    headers: HeaderMap,
) -> Response {
    if let Err(status) = authorize_bearer(&headers, &state.config.cron.secret) {
        return (status, "unauthorized").into_response();
    }

    match state.reconciliation.fix_all().await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => {
            error!(error = ?err, "jobs: webhook reconcile sweep failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "sweep failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
