//! Records shared by the persistence layer, the auth core and the routes.

mod chirp;
mod refresh_token;
mod user;

pub use chirp::{Chirp, ChirpQuery, SortOrder};
pub use refresh_token::{NewRefreshToken, RefreshToken};
pub use user::{User, UserResponse};
