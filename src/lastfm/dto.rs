//! Last.fm API Data Transfer Objects
//!
//! These types match what the Last.fm 2.0 JSON API returns for the
//! `album.getinfo`, `track.getinfo` and `artist.getinfo` methods.
//! DO NOT use these types outside the lastfm module - convert to domain types.
//!
//! API Reference: https://www.last.fm/api

use serde::{Deserialize, Serialize};

/// Any Last.fm response: either an error payload or the expected body.
///
/// Last.fm reports some failures (e.g. "Album not found") with HTTP 200 and
/// an error object, so both shapes have to be accepted on success statuses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Error(ApiError),
    Ok(T),
}

/// Error payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    /// Last.fm error code (6 = not found, 10 = invalid key, 29 = rate limited, ...)
    pub error: i32,
    pub message: String,
}

/// One image URL in a given size
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    #[serde(rename = "#text", default)]
    pub url: String,
    /// "small", "medium", "large", "extralarge", "mega" or ""
    #[serde(default)]
    pub size: String,
}

/// `album.getinfo` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumResponse {
    pub album: Album,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub image: Vec<Image>,
}

/// `track.getinfo` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackResponse {
    pub track: Track,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub name: String,
    pub artist: Option<TrackArtist>,
    /// Album the track appears on, absent for loose tracks
    pub album: Option<TrackAlbum>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackAlbum {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub image: Vec<Image>,
}

/// `artist.getinfo` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistResponse {
    pub artist: Artist,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub image: Vec<Image>,
}
