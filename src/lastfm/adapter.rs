//! Adapter layer: converts Last.fm DTOs to domain types

use super::dto::{self, AlbumResponse, ArtistResponse, TrackResponse};
use super::{ImageSet, ImageSize, RemoteAlbum, RemoteArtist, RemoteTrack};

fn images(images: Vec<dto::Image>) -> ImageSet {
    ImageSet::new(
        images
            .into_iter()
            .map(|image| (ImageSize::parse(&image.size), image.url)),
    )
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn album(response: AlbumResponse) -> RemoteAlbum {
    let album = response.album;
    RemoteAlbum {
        name: album.name,
        artist: album.artist,
        images: images(album.image),
    }
}

/// The track's artwork is the artwork of the album block it carries, if any.
pub fn track(response: TrackResponse) -> RemoteTrack {
    let track = response.track;
    let (album, images) = match track.album {
        Some(album) => (non_empty(album.title), images(album.image)),
        None => (None, ImageSet::default()),
    };

    RemoteTrack {
        name: track.name,
        artist: track.artist.and_then(|artist| non_empty(artist.name)),
        album,
        images,
    }
}

pub fn artist(response: ArtistResponse) -> RemoteArtist {
    RemoteArtist {
        name: response.artist.name,
        images: images(response.artist.image),
    }
}
