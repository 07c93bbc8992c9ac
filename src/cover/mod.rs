//! Cover art resolution.
//!
//! Artwork comes from interchangeable finders, tried in the order of the
//! user's applied rules:
//!
//! 1. **Local files** - `cover.*` or `<album>.*` next to the track
//! 2. **Host library** - the player's own album-art service
//! 3. **Remote metadata** - Last.fm album, track and artist images
//!
//! # Design Principles
//!
//! - **Latest request wins**: every search gets a request id; results of a
//!   superseded search are never applied to the display
//! - **Graceful degradation**: a failing or missing finder is logged and the
//!   next rule is tried; no cover at all is simply `None`
//! - **No persistence**: nothing found here is written to disk

pub mod finder;
pub mod host;
pub mod local;
pub mod manager;
pub mod remote;
pub mod request;

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use image::{ImageFormat, ImageReader};

use crate::lastfm::LastFmApi;

pub use finder::{CoverFinder, FinderError, FinderRegistry};
pub use host::{AlbumArtCompletion, HostAlbumArt, HostLibraryFinder};
pub use local::LocalFileFinder;
pub use manager::{CoverFinderManager, FinderEvent, SearchOptions};
pub use remote::RemoteMetadataFinder;
pub use request::{RequestId, RequestToken, RequestTracker};

/// The fixed set of finders: local files, Last.fm and, when running inside
/// a host, the host's album-art service.
pub fn standard_finders(
    lastfm: Arc<dyn LastFmApi>,
    host: Option<HostLibraryFinder>,
) -> FinderRegistry {
    let mut registry = FinderRegistry::new();
    registry
        .register(Arc::new(LocalFileFinder::new()))
        .register(Arc::new(RemoteMetadataFinder::new(lastfm)));
    if let Some(host) = host {
        registry.register(Arc::new(host));
    }
    registry
}

/// Where the cover art came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    /// An image file next to the track
    LocalFile(PathBuf),
    /// The host player's album-art service
    HostLibrary,
    /// Downloaded from the remote metadata service
    Remote(String),
}

impl std::fmt::Display for CoverSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalFile(path) => write!(f, "file {}", path.display()),
            Self::HostLibrary => f.write_str("host library"),
            Self::Remote(url) => write!(f, "Last.fm ({})", url),
        }
    }
}

/// A decoded, displayable cover image.
///
/// Construction goes through [`CoverArt::decode`], so every value holds bytes
/// that the `image` crate could actually decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    /// Raw encoded image data
    pub data: Vec<u8>,
    /// MIME type derived from the detected format
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub source: CoverSource,
}

impl CoverArt {
    /// Decode raw bytes, rejecting anything that is not a supported image.
    pub fn decode(data: Vec<u8>, source: CoverSource) -> Result<Self, image::ImageError> {
        let reader = ImageReader::new(Cursor::new(data.as_slice())).with_guessed_format()?;
        let format = reader.format();
        let decoded = reader.decode()?;

        Ok(Self {
            mime_type: format
                .map(|f| f.to_mime_type())
                .unwrap_or("application/octet-stream")
                .to_string(),
            width: decoded.width(),
            height: decoded.height(),
            data,
            source,
        })
    }

    /// File extension matching the image format, for consumers that save it.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("img")
    }
}
