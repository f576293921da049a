/// Chirp Routes

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::domain::ChirpQuery;
use crate::error::{AppError, ValidationError};
use crate::state::AppState;
use crate::validators::clean_chirp_body;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

fn parse_chirp_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| ValidationError::InvalidFormat("chirp id".to_string()).into())
}

/// POST /api/chirps
///
/// # Errors
/// - 401: missing or invalid access token
/// - 400: empty body or longer than 140 characters
pub async fn create_chirp(
    user: AuthenticatedUser,
    form: web::Json<ChirpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = clean_chirp_body(&form.body)?;
    let chirp = state.chirps.create_chirp(user.id(), &body).await?;

    tracing::info!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Chirp created");
    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
///
/// Responds 204 when nothing matches.
pub async fn list_chirps(
    query: web::Query<ChirpQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirps = state.chirps.list_chirps(&query).await?;

    if chirps.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{id}
pub async fn get_chirp(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = parse_chirp_id(&path)?;
    let chirp = state.chirps.get_chirp(id).await?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{id}
///
/// # Errors
/// - 401: missing or invalid access token
/// - 404: no such chirp
/// - 403: the chirp belongs to someone else
pub async fn delete_chirp(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = parse_chirp_id(&path)?;
    let chirp = state.chirps.get_chirp(id).await?;

    state.authenticator.ensure_owner(user.id(), chirp.user_id)?;
    state.chirps.delete_chirp(id).await?;

    tracing::info!(chirp_id = %id, user_id = %user.id(), "Chirp deleted");
    Ok(HttpResponse::NoContent().finish())
}
