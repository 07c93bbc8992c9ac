//! Cover art from the Last.fm metadata service.
//!
//! Lookup chain, first image wins:
//!
//! 1. `album.getinfo` for the track's own album (when an album is known)
//! 2. `track.getinfo`, then `album.getinfo` for the album Last.fm reports
//!    for the track, then the track's own artwork
//! 3. `artist.getinfo`
//!
//! A step with no data (not found, error payload, network failure, image
//! that fails to download or decode) falls through to the next one.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::finder::{CoverFinder, FinderError};
use super::{CoverArt, CoverSource};
use crate::lastfm::{ImageSet, LastFmApi, LastFmError};
use crate::rules::{CoverRuleKind, FindRule};
use crate::track::TrackInfo;

pub const MODULE_NAME: &str = "lastfmfinder";

/// Looks up artwork through a [`LastFmApi`] client.
///
/// The client is created once and shared by every lookup.
pub struct RemoteMetadataFinder {
    api: Arc<dyn LastFmApi>,
}

/// Names to query the service with.
#[derive(Debug, Default, PartialEq, Eq)]
struct Query {
    artist: Option<String>,
    album: Option<String>,
    title: Option<String>,
}

impl Query {
    fn for_track(track: &TrackInfo) -> Self {
        let (artist, title) = if track.is_stream() {
            track
                .artist_and_title()
                .map(|(artist, title)| (Some(artist), non_empty(&title)))
                .unwrap_or_default()
        } else {
            (non_empty(track.artist()), non_empty(track.title()))
        };

        Self {
            artist,
            album: non_empty(track.album()),
            title,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A failed call is "no data" for its own step only.
fn step<T>(what: &str, result: Result<Option<T>, LastFmError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Last.fm {} failed, trying next step: {}", what, e);
            None
        }
    }
}

impl RemoteMetadataFinder {
    pub fn new(api: Arc<dyn LastFmApi>) -> Self {
        Self { api }
    }

    async fn lookup(&self, track: &TrackInfo) -> Option<CoverArt> {
        let query = Query::for_track(track);
        let Some(artist) = query.artist.as_deref() else {
            debug!("No artist known for {}, skipping remote lookup", track.file_name());
            return None;
        };

        if let Some(album) = query.album.as_deref() {
            if let Some(cover) = self.album_cover(artist, album).await {
                return Some(cover);
            }
        }

        if let Some(title) = query.title.as_deref() {
            if let Some(info) = step("track.getinfo", self.api.track_info(artist, title).await) {
                if let Some(reported) = info.album.as_deref() {
                    let already_tried = query
                        .album
                        .as_deref()
                        .is_some_and(|album| album.eq_ignore_ascii_case(reported));
                    if !already_tried {
                        let album_artist = info.artist.as_deref().unwrap_or(artist);
                        if let Some(cover) = self.album_cover(album_artist, reported).await {
                            return Some(cover);
                        }
                    }
                }

                if let Some(cover) = self.best_image(&info.images).await {
                    return Some(cover);
                }
            }
        }

        let info = step("artist.getinfo", self.api.artist_info(artist).await)?;
        self.best_image(&info.images).await
    }

    async fn album_cover(&self, artist: &str, album: &str) -> Option<CoverArt> {
        let info = step("album.getinfo", self.api.album_info(artist, album).await)?;
        self.best_image(&info.images).await
    }

    /// Download and decode the largest image of a set.
    async fn best_image(&self, images: &ImageSet) -> Option<CoverArt> {
        let url = images.largest()?;
        let data = step("image download", self.api.download(url).await)?;

        match CoverArt::decode(data, CoverSource::Remote(url.to_string())) {
            Ok(cover) => Some(cover),
            Err(e) => {
                debug!("Skipping undecodable image {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl CoverFinder for RemoteMetadataFinder {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn rule_kind(&self) -> CoverRuleKind {
        CoverRuleKind::LastFm
    }

    async fn find(
        &self,
        track: &TrackInfo,
        _rule: &FindRule,
    ) -> Result<Option<CoverArt>, FinderError> {
        Ok(self.lookup(track).await)
    }
}
