use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use crates::{
    application::usecases::{
        authorization::AuthorizationService,
        campaigns::CampaignUseCase,
        feature_access::FeatureAccessUseCase,
        quota::QuotaUseCase,
        tenant_subscriptions::TenantSubscriptionUseCase,
    },
    domain::{
        repositories::tenants::TenantRepository,
        value_objects::enums::feature_flags::FeatureFlag,
    },
    gateway::whatsapp_client::WhatsAppClient,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            admins::AdminDirectoryPostgres, daily_quota::DailyQuotaPostgres, plans::PlanPostgres,
            tenants::TenantPostgres,
        },
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::{error_responses::error_response, guards::require_admin};
use crate::config::config_model::DotEnvyConfig;

type Subscriptions = TenantSubscriptionUseCase<PlanPostgres, TenantPostgres>;
type Access = FeatureAccessUseCase<PlanPostgres>;
type Campaigns = CampaignUseCase<PlanPostgres, DailyQuotaPostgres, WhatsAppClient>;
type Authz = AuthorizationService<AdminDirectoryPostgres>;

#[derive(Clone)]
pub struct TenantsRouteState {
    subscriptions: Arc<Subscriptions>,
    access: Arc<Access>,
    campaigns: Arc<Campaigns>,
    tenant_repo: Arc<TenantPostgres>,
    authz: Arc<Authz>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    gateway: Arc<WhatsAppClient>,
) -> Router {
    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let tenant_repo = Arc::new(TenantPostgres::new(Arc::clone(&db_pool)));
    let quota_repo = Arc::new(DailyQuotaPostgres::new(Arc::clone(&db_pool)));
    let admin_repo = Arc::new(AdminDirectoryPostgres::new(db_pool));

    let access = Arc::new(FeatureAccessUseCase::new(Arc::clone(&plan_repo)));
    let subscriptions = Arc::new(TenantSubscriptionUseCase::new(
        plan_repo,
        Arc::clone(&tenant_repo),
        Arc::clone(&access),
    ));
    let campaigns = Arc::new(CampaignUseCase::new(
        Arc::clone(&access),
        Arc::new(QuotaUseCase::new(quota_repo)),
        gateway,
    ));
    let authz = Arc::new(AuthorizationService::new(
        admin_repo,
        config.admin.allowlist.clone(),
    ));

    Router::new()
        .route("/:tenant_id/subscription", get(subscription_state))
        .route("/:tenant_id/plan", post(assign_plan))
        .route("/:tenant_id/features/:flag", get(check_feature))
        .route("/:tenant_id/campaigns", post(send_campaign))
        .with_state(TenantsRouteState {
            subscriptions,
            access,
            campaigns,
            tenant_repo,
            authz,
        })
}

pub async fn subscription_state(
    State(state): State<TenantsRouteState>,
    _auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
) -> Response {
    match state.subscriptions.subscription_state(tenant_id).await {
        Ok(dto) => Json(dto).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignPlanRequest {
    pub plan_id: Uuid,
}

/// Admin override / payment-confirmation path.
pub async fn assign_plan(
    State(state): State<TenantsRouteState>,
    auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<AssignPlanRequest>,
) -> Response {
    if let Err(denied) = require_admin(&state.authz, &auth).await {
        return denied;
    }

    match state
        .subscriptions
        .assign_plan(tenant_id, payload.plan_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureCheckResponse {
    pub feature: String,
    pub allowed: bool,
    pub reason: Option<String>,
}

pub async fn check_feature(
    State(state): State<TenantsRouteState>,
    _auth: AuthUser,
    Path((tenant_id, flag)): Path<(Uuid, String)>,
) -> Response {
    let Some(feature) = FeatureFlag::from_str(&flag) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown feature flag: {flag}"),
        );
    };

    let tenant = match state.tenant_repo.find_by_id(tenant_id).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "tenant not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    };

    match state.access.can_use_feature(&tenant, feature).await {
        Ok(decision) => Json(FeatureCheckResponse {
            feature: feature.to_string(),
            allowed: decision.allowed,
            reason: decision.reason.map(|r| r.to_string()),
        })
        .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct SendCampaignRequest {
    pub campaign_id: String,
    pub recipients: Vec<String>,
    pub text: String,
}

pub async fn send_campaign(
    State(state): State<TenantsRouteState>,
    _auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<SendCampaignRequest>,
) -> Response {
    let tenant = match state.tenant_repo.find_by_id(tenant_id).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "tenant not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    };

    // Pin the quota day up front so a run crossing midnight stays on it.
    let date = Utc::now().date_naive();

    match state
        .campaigns
        .send_bulk(
            &tenant,
            date,
            &payload.campaign_id,
            &payload.recipients,
            &payload.text,
        )
        .await
    {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => error_response(err.status_code(), err),
    }
}
