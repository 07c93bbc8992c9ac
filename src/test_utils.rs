//! Test utilities and fixtures for cover-scout tests.
//!
//! This module provides image fixtures, track fixtures and mock
//! implementations of the finder and rule seams to reduce boilerplate in
//! tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{RecordingFinder, StaticRules, cover, file_track};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let finder = RecordingFinder::returning("a", cover(4, 4));
//!     // ... register it, run a search
//!     assert_eq!(finder.call_count(), 1);
//! }
//! ```

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;

use crate::cover::{CoverArt, CoverFinder, CoverSource, FinderError};
use crate::rules::{CoverRuleKind, FindRule, RuleProvider};
use crate::track::TrackInfo;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 90]));
    let mut data = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut data), format)
        .expect("Failed to encode fixture image");
    data
}

/// A valid PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// A valid JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// A decoded cover of the given size.
pub fn cover(width: u32, height: u32) -> CoverArt {
    CoverArt::decode(png_bytes(width, height), CoverSource::HostLibrary)
        .expect("Fixture image should decode")
}

/// A local file track with full tags.
pub fn file_track() -> TrackInfo {
    TrackInfo::new(
        "Radiohead",
        "OK Computer",
        "Airbag",
        "/music/Radiohead/OK Computer/01 Airbag.flac",
    )
}

/// A radio stream reporting "Artist - Title" in its title.
pub fn stream_track() -> TrackInfo {
    TrackInfo::new("", "", "BBC Radio 1 - DJ - SongTitle", "http://stream.example/radio1")
}

enum Behaviour {
    Empty,
    Returning(CoverArt),
    Failing,
    Panicking,
}

/// Finder with a canned answer that records every call.
pub struct RecordingFinder {
    name: &'static str,
    behaviour: Behaviour,
    calls: Mutex<Vec<String>>,
}

impl RecordingFinder {
    fn build(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always finds nothing.
    pub fn empty(name: &'static str) -> Arc<Self> {
        Self::build(name, Behaviour::Empty)
    }

    /// Always finds `cover`.
    pub fn returning(name: &'static str, cover: CoverArt) -> Arc<Self> {
        Self::build(name, Behaviour::Returning(cover))
    }

    /// Always fails with an I/O error.
    pub fn failing(name: &'static str) -> Arc<Self> {
        Self::build(name, Behaviour::Failing)
    }

    /// Panics when called.
    pub fn panicking(name: &'static str) -> Arc<Self> {
        Self::build(name, Behaviour::Panicking)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// File names of the tracks it was asked about.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CoverFinder for RecordingFinder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn rule_kind(&self) -> CoverRuleKind {
        CoverRuleKind::CoverFile
    }

    async fn find(
        &self,
        track: &TrackInfo,
        _rule: &FindRule,
    ) -> Result<Option<CoverArt>, FinderError> {
        self.calls.lock().push(track.file_name().to_string());
        match &self.behaviour {
            Behaviour::Empty => Ok(None),
            Behaviour::Returning(cover) => Ok(Some(cover.clone())),
            Behaviour::Failing => Err(FinderError::Io(std::io::Error::other("disk on fire"))),
            Behaviour::Panicking => panic!("finder {} blew up", self.name),
        }
    }
}

/// Fixed list of rules.
pub struct StaticRules(pub Vec<FindRule>);

impl StaticRules {
    pub fn new(rules: Vec<FindRule>) -> Arc<Self> {
        Arc::new(Self(rules))
    }
}

impl RuleProvider for StaticRules {
    fn applied_rules(&self) -> Vec<FindRule> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_fixtures_decode() {
        assert_eq!(cover(3, 2).width, 3);
        assert!(CoverArt::decode(jpeg_bytes(4, 4), CoverSource::HostLibrary).is_ok());
    }

    #[test]
    fn test_track_fixtures() {
        assert!(!file_track().is_stream());
        assert!(stream_track().is_stream());
    }

    #[tokio::test]
    async fn test_recording_finder_records_calls() {
        let finder = RecordingFinder::failing("f");
        let rule = FindRule::new("f", CoverRuleKind::CoverFile);

        assert!(finder.find(&file_track(), &rule).await.is_err());
        assert_eq!(finder.calls(), vec![file_track().file_name().to_string()]);
    }
}
