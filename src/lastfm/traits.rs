//! Trait definition for the Last.fm client.
//!
//! The remote finder only depends on [`LastFmApi`], so tests can swap the
//! HTTP client for [`mocks::MockLastFm`].
//!
//! The client answers `Ok(None)` for any failed call, whether the service
//! had no data or could not be reached. Transport failures are logged at
//! `warn`, service answers without data at `debug`.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::client::LastFmClient;
use super::{LastFmError, RemoteAlbum, RemoteArtist, RemoteTrack};

#[async_trait]
pub trait LastFmApi: Send + Sync {
    async fn album_info(&self, artist: &str, album: &str)
    -> Result<Option<RemoteAlbum>, LastFmError>;

    async fn track_info(&self, artist: &str, track: &str)
    -> Result<Option<RemoteTrack>, LastFmError>;

    async fn artist_info(&self, artist: &str) -> Result<Option<RemoteArtist>, LastFmError>;

    async fn download(&self, url: &str) -> Result<Option<Vec<u8>>, LastFmError>;
}

/// Turn a failed call into "no answer".
fn soften<T>(what: &str, result: Result<T, LastFmError>) -> Result<Option<T>, LastFmError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_transport() => {
            warn!("Last.fm {} unreachable: {}", what, e);
            Ok(None)
        }
        Err(e) => {
            debug!("Last.fm {} gave no result: {}", what, e);
            Ok(None)
        }
    }
}

#[async_trait]
impl LastFmApi for LastFmClient {
    async fn album_info(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<RemoteAlbum>, LastFmError> {
        soften("album.getinfo", LastFmClient::album_info(self, artist, album).await)
    }

    async fn track_info(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Option<RemoteTrack>, LastFmError> {
        soften("track.getinfo", LastFmClient::track_info(self, artist, track).await)
    }

    async fn artist_info(&self, artist: &str) -> Result<Option<RemoteArtist>, LastFmError> {
        soften("artist.getinfo", LastFmClient::artist_info(self, artist).await)
    }

    async fn download(&self, url: &str) -> Result<Option<Vec<u8>>, LastFmError> {
        soften("image download", LastFmClient::download(self, url).await)
    }
}
