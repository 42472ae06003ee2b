//! Session extractors.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::AppState;

/// Name of the cookie set after a successful login.
pub const SESSION_COOKIE: &str = "spotify_token";

/// Spotify access token of the current session.
///
/// Use this as a parameter in route handlers that call Spotify; the request
/// is rejected with 401 before the handler runs when nobody is logged in.
///
/// # Example
/// ```ignore
/// async fn protected_route(token: BearerToken) -> impl Responder {
///     format!("Bearer {}", token.0)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_token(req))
    }
}

/// Pull the access token out of the shared token store.
fn extract_token(req: &HttpRequest) -> Result<BearerToken, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))?;

    state.tokens.require_token().map(BearerToken)
}

/// Value of the session cookie, if the browser sent one.
///
/// Never fails: a missing or empty cookie yields `None`.
#[derive(Debug, Clone)]
pub struct SessionCookie(pub Option<String>);

impl FromRequest for SessionCookie {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        ready(Ok(SessionCookie(token)))
    }
}
