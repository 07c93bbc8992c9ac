//! Cover Scout - album artwork for desktop media player plugins.
//!
//! The host player reports what is playing; the plugin finds a cover for it
//! by trying the user's applied rules in order (local image files, the host's
//! own album-art service, Last.fm) and hands the first hit to a display.
//!
//! Embedding hosts construct a [`plugin::CoverPlugin`] with their
//! [`plugin::Player`], [`plugin::CoverDisplay`] and optional
//! [`cover::HostAlbumArt`] implementations. The `cover-scout` binary exposes
//! the same pipeline as a command line tool.

pub mod cli;
pub mod config;
pub mod cover;
pub mod error;
pub mod lastfm;
pub mod logging;
pub mod plugin;
pub mod rules;
pub mod settings;
pub mod track;

#[cfg(test)]
pub mod test_utils;

pub use error::{Error, Result};
