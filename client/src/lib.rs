//! JobDeck API client
//!
//! The session agent owns the access/refresh token pair, attaches the
//! bearer token to outgoing requests, and transparently recovers from
//! an expired access token: one coalesced refresh, one retry, then
//! give up. Session state lives behind an explicit [`TokenStore`]
//! rather than ambient globals, so it is substitutable in tests and
//! non-browser environments.

mod error;
mod session;
mod store;

pub use error::ClientError;
pub use session::SessionAgent;
pub use store::{MemoryTokenStore, TokenPair, TokenStore};
