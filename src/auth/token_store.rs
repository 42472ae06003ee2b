//! In-memory Spotify session.
//!
//! Holds the single access/refresh token pair of the logged-in user. The
//! store is shared through application state; nothing is persisted.

use parking_lot::RwLock;
use std::future::Future;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::spotify::{TokenEndpoint, TokenGrant};

/// Snapshot of the stored tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Shared token storage. Last write wins.
#[derive(Debug, Default)]
pub struct TokenStore {
    state: RwLock<TokenState>,
    /// Serialises refresh so concurrent 401s trigger one exchange at a time.
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current access token, or `Unauthenticated` when nobody logged in.
    pub fn require_token(&self) -> AppResult<String> {
        self.state
            .read()
            .access_token
            .clone()
            .ok_or_else(AppError::missing_token)
    }

    /// Store the tokens handed out by the token endpoint.
    ///
    /// A grant without a refresh token keeps the one already stored, since
    /// Spotify only sometimes rotates it.
    pub fn store_grant(&self, grant: &TokenGrant) {
        let mut state = self.state.write();
        state.access_token = Some(grant.access_token.clone());
        if let Some(refresh_token) = &grant.refresh_token {
            state.refresh_token = Some(refresh_token.clone());
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Mutates the store in place; callers re-read with [`require_token`].
    ///
    /// [`require_token`]: TokenStore::require_token
    pub async fn refresh<E>(&self, endpoint: &E) -> AppResult<()>
    where
        E: TokenEndpoint + ?Sized,
    {
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = self.state.read().refresh_token.clone().ok_or_else(|| {
            AppError::RefreshFailed("No refresh token available. Please log in again.".to_string())
        })?;

        let grant = endpoint.refresh(&refresh_token).await?;
        self.store_grant(&grant);

        tracing::info!(
            rotated_refresh_token = grant.refresh_token.is_some(),
            "Spotify access token refreshed"
        );

        Ok(())
    }

    /// Run `op` with `token`; if Spotify rejects it with 401, refresh once and
    /// rerun `op` with the new token. The second outcome is final.
    pub async fn retry_on_unauthorized<E, T, F, Fut>(
        &self,
        endpoint: &E,
        token: String,
        op: F,
    ) -> AppResult<T>
    where
        E: TokenEndpoint + ?Sized,
        F: Fn(String) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match op(token).await {
            Err(e) if e.is_upstream_unauthorized() => {
                tracing::warn!("Spotify rejected the access token, refreshing and retrying once");
                self.refresh(endpoint).await?;
                op(self.require_token()?).await
            }
            result => result,
        }
    }
}
