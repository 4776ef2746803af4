use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use crates::{
    application::usecases::{authorization::AuthorizationService, quota::QuotaUseCase},
    domain::entities::daily_quota::DailyQuotaEntity,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{admins::AdminDirectoryPostgres, daily_quota::DailyQuotaPostgres},
    },
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::{error_responses::error_response, guards::require_admin};
use crate::config::config_model::DotEnvyConfig;

type Quota = QuotaUseCase<DailyQuotaPostgres>;
type Authz = AuthorizationService<AdminDirectoryPostgres>;

#[derive(Clone)]
pub struct QuotaRouteState {
    quota: Arc<Quota>,
    authz: Arc<Authz>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let quota_repo = Arc::new(DailyQuotaPostgres::new(Arc::clone(&db_pool)));
    let admin_repo = Arc::new(AdminDirectoryPostgres::new(db_pool));

    let quota = Arc::new(QuotaUseCase::new(quota_repo));
    let authz = Arc::new(AuthorizationService::new(
        admin_repo,
        config.admin.allowlist.clone(),
    ));

    Router::new()
        .route("/:tenant_id/:date", get(peek_quota).delete(reset_quota))
        .with_state(QuotaRouteState { quota, authz })
}

#[derive(Debug, Serialize)]
pub struct QuotaRecordDto {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub sent_count: i64,
    pub campaign_ids: BTreeSet<String>,
}

impl From<DailyQuotaEntity> for QuotaRecordDto {
    fn from(value: DailyQuotaEntity) -> Self {
        Self {
            tenant_id: value.tenant_id,
            date: value.date,
            sent_count: value.sent_count,
            campaign_ids: value.campaign_ids,
        }
    }
}

pub async fn peek_quota(
    State(state): State<QuotaRouteState>,
    auth: AuthUser,
    Path((tenant_id, date)): Path<(Uuid, NaiveDate)>,
) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.quota.peek(tenant_id, date).await {
        Ok(record) => Json(record.map(QuotaRecordDto::from)).into_response(),
        Err(err) => error_response(axum::http::StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

#[derive(Debug, Serialize)]
pub struct QuotaResetResponse {
    pub reset: bool,
}

pub async fn reset_quota(
    State(state): State<QuotaRouteState>,
    auth: AuthUser,
    Path((tenant_id, date)): Path<(Uuid, NaiveDate)>,
) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state.quota.reset(tenant_id, date).await {
        Ok(existed) => Json(QuotaResetResponse { reset: existed }).into_response(),
        Err(err) => error_response(axum::http::StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}
