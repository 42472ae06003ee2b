//! Track listings for the frontend: top tracks, the taste scatter plot and
//! the saved-tracks wall.

use actix_web::{get, web, HttpResponse};
use serde_json::Value;

use super::with_session;
use crate::auth::BearerToken;
use crate::error::{AppError, AppResult};
use crate::models::{
    AlbumCoversResponse, AppState, SavedTrackSummary, TopTrack, TracksResponse, VisualizerTrack,
};
use crate::spotify::{collect, typed, PageSource};

/// The user's 25 most played tracks.
///
/// GET /top-tracks
#[get("/top-tracks")]
pub async fn top_tracks(
    state: web::Data<AppState>,
    token: BearerToken,
) -> AppResult<HttpResponse> {
    let spotify = &state.spotify;
    let url = spotify.top_tracks_url();
    let url = url.as_str();

    let body = with_session(&state, token, |bearer| async move {
        spotify.get_json(url, &bearer).await
    })
    .await?;

    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Internal("Invalid response from Spotify".to_string()))?;

    let tracks: Vec<TopTrack> = items
        .iter()
        .cloned()
        .filter_map(typed(TopTrack::from_track))
        .collect();

    Ok(HttpResponse::Ok().json(TracksResponse { tracks }))
}

/// Every saved track as a popularity/duration point.
///
/// GET /taste-visualizer
#[get("/taste-visualizer")]
pub async fn taste_visualizer(
    state: web::Data<AppState>,
    token: BearerToken,
) -> AppResult<HttpResponse> {
    let spotify = &state.spotify;
    let seed = spotify.saved_tracks_url();
    let seed = seed.as_str();

    let tracks = with_session(&state, token, |bearer| async move {
        collect(spotify, seed, &bearer, typed(VisualizerTrack::from_saved)).await
    })
    .await?;

    if tracks.is_empty() {
        return Err(AppError::NotFound("No saved tracks found".to_string()));
    }

    Ok(HttpResponse::Ok().json(TracksResponse { tracks }))
}

/// Every saved track with its cover and formatted metadata.
///
/// GET /saved-tracks
#[get("/saved-tracks")]
pub async fn saved_tracks(
    state: web::Data<AppState>,
    token: BearerToken,
) -> AppResult<HttpResponse> {
    let spotify = &state.spotify;
    let seed = spotify.saved_tracks_url();
    let seed = seed.as_str();

    let album_covers = with_session(&state, token, |bearer| async move {
        collect(spotify, seed, &bearer, typed(SavedTrackSummary::from_saved)).await
    })
    .await?;

    if album_covers.is_empty() {
        return Err(AppError::NotFound("No saved tracks found.".to_string()));
    }

    Ok(HttpResponse::Ok().json(AlbumCoversResponse { album_covers }))
}

/// Configure track routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(top_tracks)
        .service(taste_visualizer)
        .service(saved_tracks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token_store::tests::grant;
    use crate::models::tests::test_state;
    use crate::spotify::fake::FakeSpotify;
    use crate::spotify::models::tests::saved_item;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    const SAVED: &str = "/v1/me/tracks?limit=50";
    const TOP: &str = "/v1/me/top/tracks?limit=25";

    /// App state pointed at `fake`, logged in with `access` / `refresh-1`.
    fn logged_in(fake: &FakeSpotify, access: &str) -> AppState {
        let state = AppState::new(fake.config());
        state.tokens.store_grant(&grant(access, Some("refresh-1")));
        state
    }

    #[actix_rt::test]
    async fn test_routes_require_login() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure),
        )
        .await;

        for uri in ["/top-tracks", "/taste-visualizer", "/saved-tracks"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);

            let body: serde_json::Value = test::read_body_json(res).await;
            assert_eq!(body["error"], "UNAUTHENTICATED");
        }
    }

    #[actix_rt::test]
    async fn test_saved_tracks_follows_pages_in_order() {
        let fake = FakeSpotify::start();
        let second = format!("{}/me/tracks?offset=50&limit=50", fake.api_base());
        fake.json(
            SAVED,
            200,
            json!({"items": [saved_item("One", Some("https://img/1")), {"track": null}], "next": second}),
        );
        fake.json(
            "/v1/me/tracks?offset=50&limit=50",
            200,
            json!({"items": [saved_item("Two", Some("https://img/2"))], "next": null}),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(logged_in(&fake, "tok")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/saved-tracks").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let covers = body["album_covers"].as_array().unwrap();
        assert_eq!(covers.len(), 2);
        assert_eq!(covers[0]["name"], "One");
        assert_eq!(covers[0]["artist"], "First Artist, Second Artist");
        assert_eq!(covers[0]["duration"], "3m 21s");
        assert_eq!(covers[1]["name"], "Two");
        assert_eq!(fake.bearers(SAVED), vec![Some("tok".to_string())]);
        fake.stop().await;
    }

    #[actix_rt::test]
    async fn test_empty_library_is_not_found() {
        let fake = FakeSpotify::start();
        fake.json(SAVED, 200, json!({"items": [], "next": null}));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(logged_in(&fake, "tok")))
                .configure(configure),
        )
        .await;

        for (uri, message) in [
            ("/taste-visualizer", "No saved tracks found"),
            ("/saved-tracks", "No saved tracks found."),
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", uri);

            let body: serde_json::Value = test::read_body_json(res).await;
            assert_eq!(body["error"], "NOT_FOUND");
            assert!(body["message"].as_str().unwrap().ends_with(message), "{}", uri);
        }
        fake.stop().await;
    }

    #[actix_rt::test]
    async fn test_top_tracks_without_items_is_invalid() {
        let fake = FakeSpotify::start();
        fake.json(TOP, 200, json!({"total": 0}));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(logged_in(&fake, "tok")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/top-tracks").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Invalid response from Spotify"));
        fake.stop().await;
    }

    #[actix_rt::test]
    async fn test_upstream_failure_is_server_error_with_details() {
        let fake = FakeSpotify::start();
        fake.json(
            TOP,
            429,
            json!({"error": {"status": 429, "message": "API rate limit exceeded"}}),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(logged_in(&fake, "tok")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/top-tracks").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "UPSTREAM_ERROR");
        assert_eq!(body["details"]["error"]["message"], "API rate limit exceeded");
        fake.stop().await;
    }

    #[actix_rt::test]
    async fn test_rejected_token_is_refreshed_and_retried() {
        let fake = FakeSpotify::start();
        fake.json_for("stale", SAVED, 401, json!({"error": {"status": 401, "message": "The access token expired"}}));
        fake.json_for("fresh", SAVED, 200, json!({"items": [saved_item("One", Some("https://img/1"))], "next": null}));
        fake.json("/api/token", 200, json!({"access_token": "fresh", "expires_in": 3600}));
        let state = logged_in(&fake, "stale");
        let tokens = state.tokens.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/taste-visualizer").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["tracks"][0]["name"], "One");
        assert_eq!(
            fake.bearers(SAVED),
            vec![Some("stale".to_string()), Some("fresh".to_string())]
        );
        assert_eq!(fake.bearers("/api/token").len(), 1);
        assert_eq!(tokens.require_token().unwrap(), "fresh");
        fake.stop().await;
    }

    #[actix_rt::test]
    async fn test_rejected_token_passes_through_when_refresh_disabled() {
        let fake = FakeSpotify::start();
        fake.json_for("stale", SAVED, 401, json!({"error": {"status": 401, "message": "The access token expired"}}));
        fake.json("/api/token", 200, json!({"access_token": "fresh"}));
        let mut config = fake.config();
        config.refresh_on_unauthorized = false;
        let state = AppState::new(config);
        state.tokens.store_grant(&grant("stale", Some("refresh-1")));
        let tokens = state.tokens.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/saved-tracks").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "UPSTREAM_ERROR");
        assert_eq!(fake.bearers(SAVED).len(), 1);
        assert!(fake.bearers("/api/token").is_empty());
        assert_eq!(tokens.require_token().unwrap(), "stale");
        fake.stop().await;
    }
}
