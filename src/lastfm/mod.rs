//! Last.fm remote metadata integration.
//!
//! # Architecture
//!
//! Same split as every HTTP integration in this crate:
//! - **DTOs** (`dto.rs`) - exact API response shapes
//! - **Adapter** (`adapter.rs`) - converts DTOs to the domain types below
//! - **Client** (`client.rs`) - reqwest-based HTTP client
//! - **Traits** (`traits.rs`) - [`LastFmApi`] seam used by the remote finder,
//!   with mocks for tests
//!
//! Lookups return `Ok(None)` when the service answered but had nothing
//! usable (unknown album, error payload, unexpected body). Only transport
//! failures surface as `Err`.

pub mod adapter;
pub mod client;
pub mod dto;
pub mod traits;

pub use client::LastFmClient;
pub use traits::LastFmApi;

/// Errors talking to Last.fm
#[derive(Debug, Clone, thiserror::Error)]
pub enum LastFmError {
    /// Transport failure (DNS, connect, TLS, timeout, broken body)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {0}")]
    Http(u16),

    /// Error payload returned by the API
    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    /// Body could not be parsed
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// No API key configured
    #[error("No Last.fm API key configured")]
    MissingApiKey,
}

impl LastFmError {
    /// Whether this is a transport-level failure rather than an answer from
    /// the service.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Image sizes offered by Last.fm, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageSize {
    /// Size missing or not recognised
    Unknown,
    Small,
    Medium,
    Large,
    ExtraLarge,
    Mega,
}

impl ImageSize {
    pub fn parse(size: &str) -> Self {
        match size.to_ascii_lowercase().as_str() {
            "small" => Self::Small,
            "medium" => Self::Medium,
            "large" => Self::Large,
            "extralarge" => Self::ExtraLarge,
            "mega" => Self::Mega,
            _ => Self::Unknown,
        }
    }
}

/// Image URLs of one entity in their various sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    images: Vec<(ImageSize, String)>,
}

impl ImageSet {
    /// Build a set, dropping entries without a URL.
    pub fn new(images: impl IntoIterator<Item = (ImageSize, String)>) -> Self {
        Self {
            images: images
                .into_iter()
                .filter(|(_, url)| !url.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// URL of the largest image. On ties the first listed wins.
    pub fn largest(&self) -> Option<&str> {
        self.images
            .iter()
            .rev()
            .max_by_key(|(size, _)| *size)
            .map(|(_, url)| url.as_str())
    }
}

/// Album as reported by `album.getinfo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteAlbum {
    pub name: String,
    pub artist: String,
    pub images: ImageSet,
}

/// Track as reported by `track.getinfo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTrack {
    pub name: String,
    pub artist: Option<String>,
    /// Album the service associates with the track
    pub album: Option<String>,
    /// Artwork attached to the track (its album's images)
    pub images: ImageSet,
}

/// Artist as reported by `artist.getinfo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteArtist {
    pub name: String,
    pub images: ImageSet,
}
