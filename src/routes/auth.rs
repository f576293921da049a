/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation. The refresh
/// token travels in the `Authorization: Bearer` header for both refresh and
/// revoke.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::domain::UserResponse;
use crate::error::AppError;
use crate::routes::users::CredentialsRequest;
use crate::state::AppState;

/// User profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 400: malformed email
/// - 401: unknown email or wrong password (same response for both)
pub async fn login(
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .authenticator
        .login(&form.email, &form.password)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: outcome.user.into(),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/refresh
///
/// # Errors
/// - 401: missing, unknown, revoked or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = state.authenticator.refresh(req.headers()).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 401: missing or unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.authenticator.revoke(req.headers()).await?;

    Ok(HttpResponse::NoContent().finish())
}
