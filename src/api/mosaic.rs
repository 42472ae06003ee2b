//! Album-art mosaic endpoint.

use actix_web::{get, http::header, web, HttpResponse};

use super::with_session;
use crate::auth::BearerToken;
use crate::error::{AppError, AppResult};
use crate::models::{saved_cover_url, AppState};
use crate::mosaic::MosaicGenerator;
use crate::spotify::{collect, typed};

/// Build a mosaic from every saved track's album cover.
///
/// GET /generate-mosaic
#[get("/generate-mosaic")]
pub async fn generate_mosaic(
    state: web::Data<AppState>,
    token: BearerToken,
) -> AppResult<HttpResponse> {
    let spotify = &state.spotify;
    let seed = spotify.saved_tracks_url();
    let seed = seed.as_str();

    let covers = with_session(&state, token, |bearer| async move {
        collect(spotify, seed, &bearer, typed(saved_cover_url)).await
    })
    .await?;

    if covers.is_empty() {
        return Err(AppError::NoImages);
    }

    tracing::info!(covers = covers.len(), "Generating mosaic");

    let mut generator = MosaicGenerator::new(
        spotify,
        state.mosaic.clone(),
        state.config.mosaic_path.clone(),
    )
    .concurrency(state.config.mosaic_fetch_concurrency);

    if let Some(seed) = state.config.mosaic_seed {
        generator = generator.seed(seed);
    }

    let mosaic = generator.generate(&covers).await?;

    Ok(HttpResponse::Ok()
        .content_type(mosaic.content_type)
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body(mosaic.bytes))
}

/// Configure mosaic routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_mosaic);
}
