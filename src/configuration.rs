use crate::auth::{MAX_COST, MIN_COST};
use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_static_dir() -> String {
    ".".to_string()
}

/// Deployment environment tag. Destructive admin operations only run on `Dev`.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    #[serde(alias = "prod")]
    Production,
}

impl Platform {
    pub fn is_dev(&self) -> bool {
        matches!(self, Platform::Dev)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token and credential settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    pub polka_key: String,
}

fn default_issuer() -> String {
    "chirpy".to_string()
}

fn default_access_token_expiry() -> i64 {
    60 * 60
}

fn default_refresh_token_expiry() -> i64 {
    60 * 24 * 60 * 60
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthSettings {
    fn check(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.polka_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.polka_key".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "token expiry must be positive".to_string(),
            ));
        }
        if !(MIN_COST..=MAX_COST).contains(&self.password_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.password_cost must be within {}..={}",
                MIN_COST,
                MAX_COST
            )));
        }
        Ok(())
    }
}

/// Reads `configuration.{yaml,toml,json}` if present, then `APP_*` variables
/// (`APP_AUTH__JWT_SECRET`, `APP_APPLICATION__PLATFORM`, ...).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.check()?;
    Ok(settings)
}

impl Settings {
    /// Local settings for test suites: dev or production platform as given,
    /// the cheapest bcrypt cost and a throwaway secret and webhook key.
    pub fn for_tests(platform: Platform) -> Self {
        Self {
            database: DatabaseSettings {
                username: "postgres".to_string(),
                password: "password".to_string(),
                port: 5432,
                host: "localhost".to_string(),
                database_name: "chirpy".to_string(),
            },
            application: ApplicationSettings {
                host: default_host(),
                port: 0,
                platform,
                static_dir: "public".to_string(),
            },
            auth: AuthSettings {
                jwt_secret: "test-secret-key-at-least-32-characters-long".to_string(),
                issuer: default_issuer(),
                access_token_expiry: default_access_token_expiry(),
                refresh_token_expiry: default_refresh_token_expiry(),
                password_cost: MIN_COST,
                polka_key: "test-polka-key".to_string(),
            },
        }
    }
}
