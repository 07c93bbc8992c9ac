//! Track snapshot consumed by the cover finders.

use std::path::Path;

/// Raw file information as reported by the host player.
///
/// Fields may be empty; the host does not guarantee tags are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFileInfo {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Absolute path or URI of the playing item
    pub file_name: String,
}

/// Immutable snapshot of a track taken when a search begins.
///
/// A fresh snapshot is built for every request so that a track change in the
/// host while a search is running cannot alter what the finders see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    artist: String,
    album: String,
    title: String,
    file_name: String,
    is_stream: bool,
}

/// URI prefixes that always denote a network stream.
const STREAM_PREFIXES: &[&str] = &["http", "https", "ftp"];

impl TrackInfo {
    pub fn new(
        artist: impl Into<String>,
        album: impl Into<String>,
        title: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        let file_name = file_name.into();
        let is_stream = is_stream_location(&file_name);
        Self {
            artist: artist.into(),
            album: album.into(),
            title: title.into(),
            file_name,
            is_stream,
        }
    }

    /// Build a snapshot for an out-of-band lookup where only the location,
    /// artist and album are known (e.g. a library browser entry).
    pub fn from_triplet(
        file_url: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self::new(artist, album, String::new(), file_url)
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether the track is a network stream rather than a local file.
    pub fn is_stream(&self) -> bool {
        self.is_stream
    }

    /// Directory containing the track, if it is a local file with one.
    pub fn directory(&self) -> Option<&Path> {
        if self.is_stream {
            return None;
        }
        Path::new(&self.file_name)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Artist and track title to query remote services with.
    ///
    /// Radio streams usually report an empty artist and pack
    /// "Artist - Title" into the title, so the title is split on `-` and the
    /// first two parts are used. Returns `None` when no usable pair exists.
    pub fn artist_and_title(&self) -> Option<(String, String)> {
        if !self.artist.trim().is_empty() {
            return Some((self.artist.trim().to_string(), self.title.trim().to_string()));
        }

        let mut parts = self.title.split('-').map(str::trim);
        match (parts.next(), parts.next()) {
            (Some(artist), Some(title)) if !artist.is_empty() => {
                Some((artist.to_string(), title.to_string()))
            }
            _ => None,
        }
    }
}

impl From<&HostFileInfo> for TrackInfo {
    fn from(info: &HostFileInfo) -> Self {
        Self::new(
            info.artist.clone(),
            info.album.clone(),
            info.title.clone(),
            info.file_name.clone(),
        )
    }
}

impl From<HostFileInfo> for TrackInfo {
    fn from(info: HostFileInfo) -> Self {
        Self::new(info.artist, info.album, info.title, info.file_name)
    }
}

/// Classify a location as a stream: known network prefixes or any URI
/// scheme separator.
pub fn is_stream_location(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    STREAM_PREFIXES.iter().any(|p| lower.starts_with(p)) || lower.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_is_not_stream() {
        let track = TrackInfo::new("Radiohead", "OK Computer", "Airbag", "/music/ok/01.flac");
        assert!(!track.is_stream());
        assert_eq!(track.directory(), Some(Path::new("/music/ok")));
    }

    #[test]
    fn test_windows_path_is_not_stream() {
        assert!(!is_stream_location(r"C:\music\track.flac"));
    }

    #[test]
    fn test_stream_prefixes() {
        assert!(is_stream_location("http://radio.example.com/live"));
        assert!(is_stream_location("https://radio.example.com/live"));
        assert!(is_stream_location("ftp://files.example.com/a.mp3"));
        assert!(is_stream_location("mms://radio.example.com/live"));
        assert!(is_stream_location("HTTP://LOUD.EXAMPLE.COM"));
    }

    #[test]
    fn test_stream_has_no_directory() {
        let track = TrackInfo::new("", "", "", "http://radio.example.com/a/b.mp3");
        assert!(track.is_stream());
        assert!(track.directory().is_none());
    }

    #[test]
    fn test_bare_file_name_has_no_directory() {
        let track = TrackInfo::new("", "", "", "track.mp3");
        assert!(track.directory().is_none());
    }

    #[test]
    fn test_from_host_file_info() {
        let info = HostFileInfo {
            artist: "Radiohead".to_string(),
            album: "OK Computer".to_string(),
            title: "Lucky".to_string(),
            file_name: "/music/lucky.flac".to_string(),
        };
        let track = TrackInfo::from(&info);
        assert_eq!(track.artist(), "Radiohead");
        assert_eq!(track.album(), "OK Computer");
        assert_eq!(track.title(), "Lucky");
        assert_eq!(track.file_name(), "/music/lucky.flac");
    }

    #[test]
    fn test_from_triplet() {
        let track = TrackInfo::from_triplet("/music/a.mp3", "Artist", "Album");
        assert_eq!(track.title(), "");
        assert_eq!(track.album(), "Album");
        assert!(!track.is_stream());
    }

    #[test]
    fn test_artist_and_title_prefers_tags() {
        let track = TrackInfo::new(" Portishead ", "Dummy", "Roads", "/m/roads.mp3");
        assert_eq!(
            track.artist_and_title(),
            Some(("Portishead".to_string(), "Roads".to_string()))
        );
    }

    #[test]
    fn test_artist_and_title_split_from_stream_title() {
        let track = TrackInfo::new("", "", "BBC Radio 1 - DJ - SongTitle", "http://bbc.example/r1");
        assert_eq!(
            track.artist_and_title(),
            Some(("BBC Radio 1".to_string(), "DJ".to_string()))
        );
    }

    #[test]
    fn test_artist_and_title_without_separator() {
        let track = TrackInfo::new("", "", "Station jingle", "http://radio.example/live");
        assert_eq!(track.artist_and_title(), None);
    }
}
