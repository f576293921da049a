/// Shared application state
///
/// Built once at startup and handed to every worker as `web::Data<AppState>`.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::configuration::{Platform, Settings};
use crate::db::{ChirpRepository, Store, UserRepository};
use crate::error::AppError;
use crate::middleware::HitCounter;

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Authenticator,
    pub users: Arc<dyn UserRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
    pub hits: Arc<HitCounter>,
    pub platform: Platform,
}

impl AppState {
    pub fn new<S>(settings: &Settings, store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        let platform = settings.application.platform;
        Self {
            authenticator: Authenticator::from_settings(&settings.auth, platform, store.clone()),
            users: store.clone(),
            chirps: store,
            hits: Arc::new(HitCounter::new()),
            platform,
        }
    }

    /// Wipe tokens, chirps and users and zero the hit counter.
    ///
    /// Refused with `Forbidden` before anything is touched unless the
    /// platform is `dev`.
    pub async fn reset(&self) -> Result<(), AppError> {
        if !self.platform.is_dev() {
            tracing::warn!(platform = ?self.platform, "Reset refused outside dev");
            return Err(AppError::Forbidden(
                "reset is only allowed on the dev platform".to_string(),
            ));
        }

        self.authenticator.refresh_tokens().purge_all().await?;
        self.chirps.delete_all_chirps().await?;
        self.users.delete_all_users().await?;
        self.hits.reset();

        tracing::info!("Application state reset");
        Ok(())
    }
}
