//! Authentication primitives
//!
//! JWT access tokens, single-use refresh secrets, argon2 password
//! hashing, and the request gate.

mod jwt;
mod middleware;
mod password;
pub mod refresh;

pub use jwt::{AccessClaims, TokenError, TokenService};
pub use middleware::AuthUser;
pub use password::PasswordService;
