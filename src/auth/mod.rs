/// Authentication module
///
/// Password hashing, access token signing, refresh token storage and the
/// `Authenticator` that composes them into login, refresh and revoke flows.

mod authenticator;
mod claims;
mod credentials;
mod extractors;
mod jwt;
mod password;
mod refresh_token;

pub use authenticator::{Authenticator, LoginOutcome};
pub use claims::Claims;
pub use credentials::{api_key, bearer_token};
pub use extractors::AuthenticatedUser;
pub use jwt::AccessTokenCodec;
pub use password::{PasswordHasher, MAX_COST, MIN_COST};
pub use refresh_token::{generate_refresh_token, RefreshTokenStore};
