//! Shared state and the JSON shapes handed to the frontend.

use serde::Serialize;
use std::sync::Arc;

use crate::auth::TokenStore;
use crate::config::Config;
use crate::mosaic::MosaicParams;
use crate::spotify::models::{SavedTrackItem, Track};
use crate::spotify::SpotifyClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub spotify: SpotifyClient,
    pub tokens: Arc<TokenStore>,
    pub mosaic: MosaicParams,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            spotify: SpotifyClient::new(&config),
            config: Arc::new(config),
            tokens: Arc::new(TokenStore::new()),
            mosaic: MosaicParams::default(),
        }
    }
}

/// Entry of `/top-tracks`.
#[derive(Debug, Serialize, PartialEq)]
pub struct TopTrack {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub image: String,
    pub id: String,
}

impl TopTrack {
    pub fn from_track(track: Track) -> Option<Self> {
        Some(Self {
            artist: track.first_artist()?.to_string(),
            image: track.cover_url()?.to_string(),
            album: track.album()?.name.clone(),
            id: track.id?,
            name: track.name,
        })
    }
}

/// Point on the taste scatter plot: popularity against duration.
#[derive(Debug, Serialize, PartialEq)]
pub struct VisualizerTrack {
    pub name: String,
    pub artist: String,
    pub image: String,
    /// Popularity (0-100).
    pub x: u32,
    /// Duration in seconds.
    pub y: f64,
    pub explicit: bool,
    pub release_year: String,
}

impl VisualizerTrack {
    pub fn from_saved(item: SavedTrackItem) -> Option<Self> {
        let track = item.track?;
        let album = track.album()?;

        Some(Self {
            artist: track.first_artist()?.to_string(),
            image: track.cover_url()?.to_string(),
            x: track.popularity?,
            y: track.duration_ms? as f64 / 1000.0,
            explicit: track.explicit?,
            release_year: album.release_date.as_deref()?.chars().take(4).collect(),
            name: track.name,
        })
    }
}

/// Entry of `/saved-tracks`.
#[derive(Debug, Serialize, PartialEq)]
pub struct SavedTrackSummary {
    pub image: String,
    pub name: String,
    /// Every artist, comma separated.
    pub artist: String,
    pub album: String,
    pub release_date: String,
    /// Formatted as `3m 21s`.
    pub duration: String,
    pub popularity: u32,
}

impl SavedTrackSummary {
    pub fn from_saved(item: SavedTrackItem) -> Option<Self> {
        let track = item.track?;
        let album = track.album()?;

        Some(Self {
            image: track.cover_url()?.to_string(),
            artist: track
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album: album.name.clone(),
            release_date: album.release_date.clone()?,
            duration: format_duration(track.duration_ms?),
            popularity: track.popularity?,
            name: track.name,
        })
    }
}

/// Album cover URL of a saved track, used as mosaic input.
pub fn saved_cover_url(item: SavedTrackItem) -> Option<String> {
    item.track?.cover_url().map(str::to_owned)
}

fn format_duration(duration_ms: u64) -> String {
    format!("{}m {}s", duration_ms / 60_000, duration_ms % 60_000 / 1000)
}

#[derive(Debug, Serialize)]
pub struct TracksResponse<T> {
    pub tracks: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct AlbumCoversResponse {
    pub album_covers: Vec<SavedTrackSummary>,
}

#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub logged_in: bool,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}
