//! Tastemap - backend relay for a Spotify listening-taste visualizer.
//!
//! Runs the Spotify authorization-code login, keeps the resulting tokens in
//! memory and serves simplified track listings plus an album-art mosaic to
//! the frontend.

mod api;
mod auth;
mod config;
mod error;
mod models;
mod mosaic;
mod spotify;

use std::future::Future;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::models::AppState;

/// Initialize the tracing/logging subsystem.
fn init_tracing(config: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            subscriber
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

/// Allow the frontend origin, with credentials so the session cookie flows.
fn configure_cors(config: &config::Config) -> Cors {
    Cors::default()
        .allowed_origin(&config.frontend_url)
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Graceful shutdown handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize configuration
    let config = config::init();

    // Initialize logging
    init_tracing(config);

    // Validate configuration
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }

    let app_state = AppState::new(config.clone());

    let bind_address = config.bind_address();

    tracing::info!(
        address = %bind_address,
        frontend = %config.frontend_url,
        mosaic_path = %config.mosaic_path.display(),
        refresh_on_401 = config.refresh_on_unauthorized,
        "Starting tastemap server"
    );

    // Create and start server
    let server = HttpServer::new(move || {
        App::new()
            // Middleware (order matters - the last one wrapped runs first)
            .wrap(TracingLogger::default())
            .wrap(configure_cors(config))
            // Shared state
            .app_data(web::Data::new(app_state.clone()))
            // Liveness (no session required)
            .configure(api::health::configure)
            // Login flow
            .configure(api::auth::configure)
            // Spotify-backed endpoints (session required)
            .configure(api::tracks::configure)
            .configure(api::mosaic::configure)
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .disable_signals()
    .run();

    // Run server with graceful shutdown
    run_until(server, shutdown_signal()).await
}

/// Drive `server` until it exits on its own or `shutdown` resolves. On
/// shutdown the server stops accepting and in-flight requests get up to the
/// configured shutdown timeout to finish.
async fn run_until(server: Server, shutdown: impl Future<Output = ()>) -> std::io::Result<()> {
    let handle = server.handle();
    let mut running = actix_web::rt::spawn(server);

    tokio::select! {
        result = &mut running => {
            return result.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        }
        _ = shutdown => {
            tracing::info!("Draining in-flight requests");
            handle.stop(true).await;
        }
    }

    running
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[actix_rt::test]
    async fn test_shutdown_lets_in_flight_requests_finish() {
        let server = HttpServer::new(|| {
            App::new().route(
                "/slow",
                web::get().to(|| async {
                    actix_web::rt::time::sleep(Duration::from_millis(300)).await;
                    "done"
                }),
            )
        })
        .workers(1)
        .shutdown_timeout(5)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let running = actix_web::rt::spawn(run_until(server.run(), async {
            stop_rx.await.ok();
        }));

        let request = actix_web::rt::spawn(async move {
            reqwest::get(format!("http://{}/slow", addr))
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        });
        actix_web::rt::time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(()).unwrap();

        assert_eq!(request.await.unwrap(), "done");
        running.await.unwrap().unwrap();
    }
}
