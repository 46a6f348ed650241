//! Data access layer

mod refresh_token;
mod user;

pub use refresh_token::{RefreshTokenRecord, RefreshTokenStore};
pub use user::{UserRecord, UserRepository};
