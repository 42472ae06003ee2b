//! Spotify session handling.

pub mod middleware;
pub mod token_store;

pub use middleware::{BearerToken, SessionCookie, SESSION_COOKIE};
pub use token_store::TokenStore;
