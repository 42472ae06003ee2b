//! HTTP routes.

pub mod auth;
pub mod health;
pub mod mosaic;
pub mod tracks;

use std::future::Future;

use crate::auth::BearerToken;
use crate::error::AppResult;
use crate::models::AppState;

/// Run a Spotify call with the session token, refreshing once on 401 when
/// the deployment allows it.
pub(crate) async fn with_session<T, F, Fut>(state: &AppState, token: BearerToken, op: F) -> AppResult<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    if state.config.refresh_on_unauthorized {
        state
            .tokens
            .retry_on_unauthorized(&state.spotify, token.0, op)
            .await
    } else {
        op(token.0).await
    }
}
