//! JobDeck Shared Library
//!
//! Wire types and the machine-readable auth error code taxonomy,
//! used by both the backend and the client session agent.

pub mod codes;
pub mod types;

pub use codes::AuthCode;
pub use types::*;
