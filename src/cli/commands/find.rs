//! One-off cover lookup.

use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::cover::{self, CoverFinderManager};
use crate::error::ResultExt;
use crate::lastfm::LastFmClient;
use crate::settings::PluginSettings;
use crate::track::{TrackInfo, is_stream_location};

/// Arguments of the `find` command
pub struct FindArgs<'a> {
    pub location: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub title: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub api_key: Option<&'a str>,
}

impl FindArgs<'_> {
    fn track(&self) -> TrackInfo {
        let title = match self.title {
            Some(title) => title.to_string(),
            None if is_stream_location(self.location) => String::new(),
            None => Path::new(self.location)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        TrackInfo::new(
            self.artist.unwrap_or_default(),
            self.album.unwrap_or_default(),
            title,
            self.location,
        )
    }
}

/// Find the cover for a track with the configured rules
pub fn cmd_find(rt: &Runtime, settings: Arc<PluginSettings>, args: &FindArgs<'_>) -> anyhow::Result<()> {
    let mut lastfm_config = settings.lastfm();
    if let Some(key) = args.api_key {
        lastfm_config.api_key = key.to_string();
    }
    if lastfm_config.api_key.is_empty() {
        tracing::info!("No Last.fm API key configured, remote lookups will find nothing");
    }

    let lastfm = Arc::new(LastFmClient::new(&lastfm_config)?);
    let manager = CoverFinderManager::new(
        cover::standard_finders(lastfm, None),
        settings.clone(),
        settings.search_options(),
        rt.handle().clone(),
    );

    let track = args.track();
    println!("Searching cover for: {}", track.file_name());
    if track.is_stream() {
        println!("  (stream, remote lookup only)");
    }
    println!();

    let Some(found) = rt.block_on(manager.find_cover_image(&track)) else {
        println!("✗ No cover found.");
        return Ok(());
    };

    println!("✓ Cover found");
    println!("  Source: {}", found.source);
    println!("  Format: {}", found.mime_type);
    println!("  Size:   {}x{}", found.width, found.height);

    if let Some(output) = args.output {
        std::fs::write(output, &found.data)
            .with_context(format!("Failed to write {}", output.display()))?;
        println!();
        println!("Saved to {:?}", output);
    }

    Ok(())
}
