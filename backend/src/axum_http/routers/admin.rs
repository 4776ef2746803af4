use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    application::usecases::authorization::AuthorizationService,
    domain::{
        entities::admins::AdminBootstrapOutcome,
        repositories::admins::AdminDirectoryRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::admins::AdminDirectoryPostgres,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::axum_http::error_responses::error_response;
use crate::config::config_model::DotEnvyConfig;

type Authz = AuthorizationService<AdminDirectoryPostgres>;

#[derive(Clone)]
pub struct AdminRouteState {
    admin_repo: Arc<AdminDirectoryPostgres>,
    authz: Arc<Authz>,
    setup_secret: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let admin_repo = Arc::new(AdminDirectoryPostgres::new(db_pool));
    let authz = Arc::new(AuthorizationService::new(
        Arc::clone(&admin_repo),
        config.admin.allowlist.clone(),
    ));

    Router::new()
        .route("/bootstrap", post(bootstrap_admin))
        .route("/diagnose", get(diagnose_admin))
        .with_state(AdminRouteState {
            admin_repo,
            authz,
            setup_secret: config.admin.setup_secret.clone(),
        })
}

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub status: &'static str,
}

/// One-time setup endpoint. Gated by a shared-secret header, not a
/// credential.
pub async fn bootstrap_admin(
    State(state): State<AdminRouteState>,
    headers: HeaderMap,
    Json(payload): Json<BootstrapRequest>,
) -> Response {
    let provided = headers
        .get("x-admin-setup-secret")
        .and_then(|value| value.to_str().ok());

    if provided != Some(state.setup_secret.as_str()) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid setup secret");
    }

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "email is required");
    }

    match state.admin_repo.upsert_active(&payload.uid, &email).await {
        Ok(AdminBootstrapOutcome::Created) => {
            info!(uid = %payload.uid, "admin: directory record created");
            (StatusCode::CREATED, Json(BootstrapResponse { status: "created" })).into_response()
        }
        Ok(AdminBootstrapOutcome::Reactivated) => {
            info!(uid = %payload.uid, "admin: directory record reactivated");
            Json(BootstrapResponse {
                status: "reactivated",
            })
            .into_response()
        }
        Ok(AdminBootstrapOutcome::AlreadyActive) => {
            error_response(StatusCode::CONFLICT, "admin record already active")
        }
        Err(err) => {
            error!(uid = %payload.uid, db_error = ?err, "admin: bootstrap failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err)
        }
    }
}

/// Reports how each of the three admin mechanisms sees the caller, so drift
/// between them is visible.
pub async fn diagnose_admin(State(state): State<AdminRouteState>, auth: AuthUser) -> Response {
    match state.authz.diagnose(&auth.principal()).await {
        Ok(diagnostic) => Json(diagnostic).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}
