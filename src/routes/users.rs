/// User Routes
///
/// Registration and credential updates.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::domain::UserResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Email and password, used for registration, login and updates
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or password outside policy
/// - 409: email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .authenticator
        .register(&form.email, &form.password)
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Replaces the signed-in user's email and password.
///
/// # Errors
/// - 401: missing or invalid access token
/// - 400: invalid email or password outside policy
/// - 409: email belongs to another user
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let updated = state
        .authenticator
        .update_credentials(user.id(), &form.email, &form.password)
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}
