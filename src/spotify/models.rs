//! Spotify Web API wire types, trimmed to the fields the visualizer reads.
//!
//! Everything is optional or defaulted so that a single odd item never fails
//! a whole page; projections decide which fields they actually require.

use serde::Deserialize;

/// Entry of `/me/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrackItem {
    pub track: Option<Track>,
}

/// Full track object (entry of `/me/top/tracks`).
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    pub popularity: Option<u32>,
    pub duration_ms: Option<u64>,
    pub explicit: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

impl Track {
    pub fn album(&self) -> Option<&Album> {
        self.album.as_ref()
    }

    pub fn first_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    /// URL of the album's first (largest) image.
    pub fn cover_url(&self) -> Option<&str> {
        self.album()?.images.first().map(|i| i.url.as_str())
    }
}
