use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use crates::application::usecases::authorization::AdminPrincipal;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::config_loader;

/// Claims carried by the identity provider's bearer credential. `admin` is
/// the optional custom claim; only a literal `true` grants anything.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub admin: Option<bool>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub admin_claim: bool,
}

impl AuthUser {
    pub fn principal(&self) -> AdminPrincipal {
        AdminPrincipal {
            uid: self.uid.clone(),
            email: self.email.clone(),
            admin_claim: self.admin_claim,
        }
    }
}

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

// Tell axum how to convert `AuthError` into a response.
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNAUTHORIZED,
            format!("Unauthenticated: {}", self.0),
        )
            .into_response()
    }
}

pub fn validate_bearer_jwt(token: &str) -> Result<AuthClaims, AuthError> {
    let secret = config_loader::get_jwt_secret()
        .map_err(|e| anyhow::anyhow!("Failed to load auth secret: {}", e))?;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<AuthClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// Authenticates the bearer: Authorization header first, then the `session`
/// cookie. Always rejects with 401, never 403; authorization happens after
/// authentication.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => session_cookie_token(parts).ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing credential".to_string(),
            ))?,
        };

        let claims = validate_bearer_jwt(&token)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.0.to_string()))?;

        Ok(AuthUser {
            uid: claims.sub,
            email: claims.email,
            admin_claim: claims.admin == Some(true),
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth_str = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn session_cookie_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get("session").map(|cookie| cookie.value().to_string())
}
