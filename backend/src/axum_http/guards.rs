use axum::response::Response;
use crates::{
    application::usecases::authorization::AuthorizationService,
    domain::repositories::admins::AdminDirectoryRepository,
};

use crate::auth::AuthUser;
use crate::axum_http::error_responses::error_response;

/// Authorization step for admin-only routes. The caller is already
/// authenticated (the extractor rejected anonymous requests with 401); this
/// turns an insufficient caller into 403.
pub async fn require_admin<A>(
    authz: &AuthorizationService<A>,
    auth: &AuthUser,
) -> Result<(), Response>
where
    A: AdminDirectoryRepository + Send + Sync + 'static,
{
    authz
        .authorize_admin(&auth.principal())
        .await
        .map_err(|err| error_response(err.status_code(), err))
}
