//! Liveness endpoints.

use actix_web::{get, web, HttpResponse};
use serde::Serialize;

/// Root response the frontend pings on load.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// GET /
#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        message: "API is running",
    })
}

/// Health check endpoint.
///
/// GET /health
///
/// Returns 200 if the service is running.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: env!("CARGO_PKG_NAME"),
    })
}

/// Configure health routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root).service(health);
}
