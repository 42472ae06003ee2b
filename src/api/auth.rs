//! Login flow and session inspection endpoints.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{get, http::header, web, HttpResponse};
use serde::Deserialize;

use crate::auth::{SessionCookie, TokenStore, SESSION_COOKIE};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{AccessTokenResponse, AppState, AuthStatusResponse};
use crate::spotify::TokenEndpoint;

/// Query string Spotify appends when redirecting back to us.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Set instead of `code` when the user declined.
    pub error: Option<String>,
}

/// Build the browser-side login marker.
fn session_cookie(token: &str, domain: Option<&str>) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::hours(1))
        .finish();

    if let Some(domain) = domain {
        cookie.set_domain(domain.to_string());
    }

    cookie
}

/// Exchange `code`, remember the tokens and send the browser to the frontend.
async fn complete_login<E>(
    endpoint: &E,
    tokens: &TokenStore,
    config: &Config,
    code: &str,
) -> AppResult<HttpResponse>
where
    E: TokenEndpoint + ?Sized,
{
    let grant = endpoint.exchange_code(code).await?;
    tokens.store_grant(&grant);

    tracing::info!(
        expires_in = ?grant.expires_in,
        scope = ?grant.scope,
        "Spotify login completed"
    );

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, config.frontend_url.as_str()))
        .cookie(session_cookie(
            &grant.access_token,
            config.cookie_domain.as_deref(),
        ))
        .finish())
}

/// Redirect to Spotify's consent screen.
///
/// GET /login
#[get("/login")]
pub async fn login(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, state.spotify.authorize_url()))
        .finish()
}

/// OAuth redirect target.
///
/// GET /callback?code=...
#[get("/callback")]
pub async fn callback(
    state: web::Data<AppState>,
    query: web::Query<CallbackQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();

    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Spotify authorization was not granted");
        return Err(AppError::AuthFailed(serde_json::json!({ "error": error })));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    complete_login(&state.spotify, &state.tokens, &state.config, &code).await
}

/// Whether the browser carries a session cookie.
///
/// GET /auth-status
#[get("/auth-status")]
pub async fn auth_status(cookie: SessionCookie) -> HttpResponse {
    tracing::debug!(logged_in = cookie.0.is_some(), "Auth status checked");

    HttpResponse::Ok().json(AuthStatusResponse {
        logged_in: cookie.0.is_some(),
        token: cookie.0,
    })
}

/// Expose the stored access token to the frontend.
///
/// GET /get-token
#[get("/get-token")]
pub async fn get_token(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let access_token = state
        .tokens
        .require_token()
        .map_err(|_| AppError::Unauthenticated("No token found".to_string()))?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

/// Configure auth routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(callback)
        .service(auth_status)
        .service(get_token);
}
