//! Find cover art image files in the same directory as the track.
//!
//! Two naming patterns are supported:
//! - `cover.*` for [`CoverRuleKind::CoverFile`]
//! - `<album>.*` for [`CoverRuleKind::AlbumFile`]
//!
//! Matching is case-insensitive and non-recursive. Every match is decoded in
//! name order and the first file that is a valid image wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::finder::{CoverFinder, FinderError};
use super::{CoverArt, CoverSource};
use crate::rules::{CoverRuleKind, FindRule};
use crate::track::TrackInfo;

pub const MODULE_NAME: &str = "localfinder";

/// Stem used by the `cover.*` rule.
const COVER_STEM: &str = "cover";

/// Characters that can never appear in a file name on this platform.
#[cfg(windows)]
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
#[cfg(not(windows))]
const INVALID_FILE_NAME_CHARS: &[char] = &['/'];

/// Looks for image files next to the track.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileFinder;

impl LocalFileFinder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CoverFinder for LocalFileFinder {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn rule_kind(&self) -> CoverRuleKind {
        CoverRuleKind::CoverFile
    }

    async fn find(
        &self,
        track: &TrackInfo,
        rule: &FindRule,
    ) -> Result<Option<CoverArt>, FinderError> {
        let Some(dir) = track.directory() else {
            return Ok(None);
        };

        let Some(stem) = pattern_stem(rule.kind, track)? else {
            debug!("Skipping {} lookup: no usable file name for {:?}", rule.kind, track.album());
            return Ok(None);
        };

        let dir = dir.to_path_buf();
        let stem = stem.to_string();
        tokio::task::spawn_blocking(move || probe_directory(&dir, &stem))
            .await
            .map_err(|e| FinderError::Io(std::io::Error::other(e)))?
    }
}

/// The glob-style pattern a rule searches for, e.g. `"Abbey Road.*"`.
///
/// Returns `Ok(None)` when the metadata cannot form a valid file name.
pub fn search_pattern(kind: CoverRuleKind, track: &TrackInfo) -> Result<Option<String>, FinderError> {
    Ok(pattern_stem(kind, track)?.map(|stem| format!("{}.*", stem)))
}

/// File name stem for a rule, validated against the platform's rules.
fn pattern_stem(kind: CoverRuleKind, track: &TrackInfo) -> Result<Option<&str>, FinderError> {
    let stem = match kind {
        CoverRuleKind::CoverFile => COVER_STEM,
        CoverRuleKind::AlbumFile => track.album(),
        other => {
            return Err(FinderError::UnsupportedRule {
                module: MODULE_NAME,
                rule: other,
            });
        }
    };

    if stem.is_empty() || contains_invalid_file_name_chars(stem) {
        return Ok(None);
    }
    Ok(Some(stem))
}

/// Whether `name` contains a character that is illegal in file names on this
/// platform. Control characters (including NUL) are always rejected.
pub fn contains_invalid_file_name_chars(name: &str) -> bool {
    name.chars()
        .any(|c| c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c))
}

/// Whether `file_name` matches `<stem>.*`, ignoring case.
fn matches_stem(file_name: &str, stem: &str) -> bool {
    let file_name = file_name.to_lowercase();
    let prefix = format!("{}.", stem.to_lowercase());
    file_name.len() > prefix.len() && file_name.starts_with(&prefix)
}

/// Decode matching files in name order and return the first valid image.
fn probe_directory(dir: &Path, stem: &str) -> Result<Option<CoverArt>, FinderError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| matches_stem(n, stem))
        })
        .collect();
    candidates.sort();

    for path in candidates {
        debug!("Loading image from disk: {:?}", path);

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                debug!("Could not read {:?}: {}", path, e);
                continue;
            }
        };

        match CoverArt::decode(data, CoverSource::LocalFile(path.clone())) {
            Ok(cover) => return Ok(Some(cover)),
            // Not an image, or an unsupported format
            Err(e) => debug!("Skipping {:?}: {}", path, e),
        }
    }

    Ok(None)
}
