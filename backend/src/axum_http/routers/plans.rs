use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    application::usecases::{
        authorization::AuthorizationService, plan_catalog::PlanCatalogUseCase,
    },
    domain::value_objects::plans::PlanDto,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{admins::AdminDirectoryPostgres, plans::PlanPostgres},
    },
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::{error_responses::error_response, guards::require_admin};
use crate::config::config_model::DotEnvyConfig;

type Catalog = PlanCatalogUseCase<PlanPostgres>;
type Authz = AuthorizationService<AdminDirectoryPostgres>;

#[derive(Clone)]
pub struct PlansRouteState {
    catalog: Arc<Catalog>,
    authz: Arc<Authz>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let admin_repo = Arc::new(AdminDirectoryPostgres::new(db_pool));

    let catalog = Arc::new(PlanCatalogUseCase::new(plan_repo));
    let authz = Arc::new(AuthorizationService::new(
        admin_repo,
        config.admin.allowlist.clone(),
    ));

    Router::new()
        .route("/", get(list_plans))
        .route("/sync", post(sync_plans))
        .route("/:plan_id", get(get_plan))
        .with_state(PlansRouteState { catalog, authz })
}

pub async fn list_plans(State(state): State<PlansRouteState>, _auth: AuthUser) -> Response {
    match state.catalog.list_paid_plans().await {
        Ok(plans) => {
            let body: Vec<PlanDto> = plans.into_iter().map(PlanDto::from).collect();
            Json(body).into_response()
        }
        Err(err) => error_response(err.status_code(), err),
    }
}

pub async fn get_plan(
    State(state): State<PlansRouteState>,
    _auth: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Response {
    match state.catalog.get_plan(plan_id).await {
        Ok(plan) => Json(PlanDto::from(plan)).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}

pub async fn sync_plans(State(state): State<PlansRouteState>, auth: AuthUser) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.catalog.sync_plans().await {
        Ok(report) => Json(report).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}
