/// Payment provider webhooks
///
/// The API key is checked before the body is parsed.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, ValidationError};
use crate::state::AppState;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Deserialize, Default)]
pub struct WebhookData {
    pub user_id: Option<Uuid>,
}

/// POST /api/polka/webhooks
///
/// Only `user.upgraded` has an effect; other events are acknowledged.
///
/// # Errors
/// - 401: missing or wrong `ApiKey`
/// - 400: malformed body
/// - 404: unknown user, including an upgrade without a user id
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.authenticator.authorize_webhook(req.headers())?;

    let payload: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;

    if payload.event != USER_UPGRADED {
        tracing::debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = payload.data.user_id.ok_or_else(|| {
        tracing::warn!("Upgrade event without a user id");
        AppError::NotFound("user".to_string())
    })?;
    state.authenticator.upgrade_user(user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
