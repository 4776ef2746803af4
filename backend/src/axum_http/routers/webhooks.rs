use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    application::usecases::{
        authorization::AuthorizationService, feature_access::FeatureAccessUseCase,
        webhook_reconciliation::WebhookReconciliationUseCase,
    },
    gateway::whatsapp_client::WhatsAppClient,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            admins::AdminDirectoryPostgres, plans::PlanPostgres, tenants::TenantPostgres,
        },
    },
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::{error_responses::error_response, guards::require_admin};
use crate::config::config_model::DotEnvyConfig;

type Reconciliation = WebhookReconciliationUseCase<PlanPostgres, TenantPostgres, WhatsAppClient>;
type Authz = AuthorizationService<AdminDirectoryPostgres>;

#[derive(Clone)]
pub struct WebhooksRouteState {
    reconciliation: Arc<Reconciliation>,
    authz: Arc<Authz>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    gateway: Arc<WhatsAppClient>,
) -> Router {
    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let tenant_repo = Arc::new(TenantPostgres::new(Arc::clone(&db_pool)));
    let admin_repo = Arc::new(AdminDirectoryPostgres::new(db_pool));

    let reconciliation = Arc::new(WebhookReconciliationUseCase::new(
        Arc::new(FeatureAccessUseCase::new(plan_repo)),
        tenant_repo,
        gateway,
        config.whatsapp.automation_webhook_url.clone(),
    ));
    let authz = Arc::new(AuthorizationService::new(
        admin_repo,
        config.admin.allowlist.clone(),
    ));

    Router::new()
        .route("/validate-all", get(validate_all))
        .route("/fix-all", post(fix_all))
        .route("/:tenant_id", get(validate))
        .route("/:tenant_id/fix", post(fix))
        .with_state(WebhooksRouteState {
            reconciliation,
            authz,
        })
}

pub async fn validate(
    State(state): State<WebhooksRouteState>,
    auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.reconciliation.validate(tenant_id).await {
        Ok(check) => Json(check).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}

pub async fn fix(
    State(state): State<WebhooksRouteState>,
    auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.reconciliation.fix(tenant_id).await {
        Ok(check) => Json(check).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}

pub async fn validate_all(State(state): State<WebhooksRouteState>, auth: AuthUser) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.reconciliation.validate_all().await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}

pub async fn fix_all(State(state): State<WebhooksRouteState>, auth: AuthUser) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.reconciliation.fix_all().await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}
