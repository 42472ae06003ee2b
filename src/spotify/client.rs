//! Spotify Web API and accounts client.
//!
//! Covers the authorization-code flow (authorize URL, code exchange, refresh),
//! authenticated JSON GETs for the Web API, and raw album-art downloads.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::pagination::PageSource;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Scopes requested at login.
pub const SCOPES: &str = "user-top-read user-library-read";

/// Page size used for saved-track listings.
pub const SAVED_TRACKS_PAGE_SIZE: u32 = 50;

/// Number of top tracks shown by the frontend.
pub const TOP_TRACKS_LIMIT: u32 = 25;

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenGrant {
    /// Interpret a token endpoint body, handing it back untouched when it
    /// carries no access token.
    pub fn from_response(body: Value) -> Result<Self, Value> {
        match serde_json::from_value::<TokenGrant>(body.clone()) {
            Ok(grant) if !grant.access_token.is_empty() => Ok(grant),
            _ => Err(body),
        }
    }
}

/// The token endpoint, as seen by the session store.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> AppResult<TokenGrant>;

    /// Trade a refresh token for a fresh access token.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenGrant>;
}

/// Spotify client bound to one application's credentials.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    api_base: String,
    accounts_base: String,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            api_base: config.api_base.clone(),
            accounts_base: config.accounts_base.clone(),
        }
    }

    /// Where `/login` sends the browser.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}",
            self.accounts_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
        )
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_base)
    }

    /// First page of the user's top tracks.
    pub fn top_tracks_url(&self) -> String {
        format!("{}/me/top/tracks?limit={}", self.api_base, TOP_TRACKS_LIMIT)
    }

    /// First page of the user's saved tracks.
    pub fn saved_tracks_url(&self) -> String {
        format!("{}/me/tracks?limit={}", self.api_base, SAVED_TRACKS_PAGE_SIZE)
    }

    async fn post_token_form(&self, form: &[(&str, &str)]) -> AppResult<Value> {
        let res = self
            .http
            .post(self.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(form)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        tracing::debug!(status = %status.as_u16(), "Token endpoint responded");

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// Download raw bytes, typically an album cover.
    pub async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::decode(url, e))?;

        if !res.status().is_success() {
            return Err(AppError::decode(url, format!("status {}", res.status())));
        }

        let bytes = res.bytes().await.map_err(|e| AppError::decode(url, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TokenEndpoint for SpotifyClient {
    async fn exchange_code(&self, code: &str) -> AppResult<TokenGrant> {
        let body = self
            .post_token_form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .await?;

        TokenGrant::from_response(body).map_err(AppError::AuthFailed)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenGrant> {
        let body = self
            .post_token_form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .await?;

        TokenGrant::from_response(body).map_err(|body| {
            tracing::warn!(response = %body, "Refresh response carried no access token");
            AppError::RefreshFailed("Failed to refresh access token".to_string())
        })
    }
}

#[async_trait]
impl PageSource for SpotifyClient {
    async fn get_json(&self, url: &str, bearer: &str) -> AppResult<Value> {
        let res = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", bearer))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = %status.as_u16(), "Spotify request failed");
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(res.json().await?)
    }
}
