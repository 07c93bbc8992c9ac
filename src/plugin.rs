//! Host boundary.
//!
//! [`CoverPlugin`] is what the host integration layer talks to: it forwards
//! playback events to the [`CoverFinderManager`] and pushes the results to
//! a [`CoverDisplay`]. A background pump applies an `EndRequest` only if it
//! belongs to the latest search and the player is still playing, so a slow
//! lookup for a previous track can never replace the current cover.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cover::manager::SearchHandle;
use crate::cover::{
    self, CoverArt, CoverFinderManager, FinderEvent, HostAlbumArt, HostLibraryFinder,
};
use crate::error::Result;
use crate::lastfm::LastFmClient;
use crate::settings::PluginSettings;
use crate::track::{HostFileInfo, TrackInfo};

/// Player state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

/// The host player.
pub trait Player: Send + Sync {
    /// Metadata of the file currently loaded, if any.
    fn current_file(&self) -> Option<HostFileInfo>;

    fn state(&self) -> PlaybackState;
}

/// The cover window, or whatever shows the cover.
///
/// Called from runtime worker threads; implementations marshal to their UI
/// thread themselves.
pub trait CoverDisplay: Send + Sync {
    /// A search started.
    fn begin_loading(&self);

    /// Show a cover, or the placeholder for `None`.
    fn show_cover(&self, cover: Option<CoverArt>);
}

/// Host notifications the plugin reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    StreamStart,
    StreamStartSubtrack,
    Play,
    Stop,
}

/// The running plugin.
pub struct CoverPlugin {
    manager: CoverFinderManager,
    settings: Arc<PluginSettings>,
    player: Arc<dyn Player>,
    display: Arc<dyn CoverDisplay>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl CoverPlugin {
    pub fn new(
        manager: CoverFinderManager,
        settings: Arc<PluginSettings>,
        player: Arc<dyn Player>,
        display: Arc<dyn CoverDisplay>,
    ) -> Self {
        Self {
            manager,
            settings,
            player,
            display,
            pump: Mutex::new(None),
        }
    }

    /// Wire up the standard finders from the settings.
    ///
    /// `host_art` is the host's album-art service, when it offers one.
    pub fn from_settings(
        settings: Arc<PluginSettings>,
        player: Arc<dyn Player>,
        display: Arc<dyn CoverDisplay>,
        host_art: Option<Arc<dyn HostAlbumArt>>,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self> {
        let lastfm = Arc::new(LastFmClient::new(&settings.lastfm())?);
        let host = host_art
            .map(|service| HostLibraryFinder::with_timeout(service, settings.host_library_timeout()));
        let manager = CoverFinderManager::new(
            cover::standard_finders(lastfm, host),
            settings.clone(),
            settings.search_options(),
            runtime,
        );
        Ok(Self::new(manager, settings, player, display))
    }

    pub fn manager(&self) -> &CoverFinderManager {
        &self.manager
    }

    pub fn settings(&self) -> &Arc<PluginSettings> {
        &self.settings
    }

    /// Start delivering search results and show the current cover if the
    /// window is enabled.
    pub fn initialize(&self) {
        let mut pump = self.pump.lock();
        if pump.is_none() {
            let events = self.manager.subscribe();
            *pump = Some(self.manager.runtime().spawn(deliver_results(
                events,
                self.manager.clone(),
                self.settings.clone(),
                self.player.clone(),
                self.display.clone(),
            )));
        }
        drop(pump);

        info!("Cover plugin initialized ({:?})", self.manager.finders());
        if self.window_shown() {
            self.request_fresh_cover();
        }
    }

    pub fn on_host_event(&self, event: HostEvent) {
        debug!("Host event {:?}", event);
        match event {
            HostEvent::StreamStart | HostEvent::StreamStartSubtrack | HostEvent::Play => {
                self.request_fresh_cover();
            }
            HostEvent::Stop => {
                if self.window_shown() {
                    self.display.show_cover(None);
                }
            }
        }
    }

    /// Menu toggle for the cover window.
    pub fn set_window_visible(&self, visible: bool) {
        self.settings.set_window_enabled(visible);
        if visible {
            self.request_fresh_cover();
        }
    }

    /// Search for the playing track's cover.
    ///
    /// Does nothing while the window is hidden; shows the placeholder when
    /// nothing is playing.
    pub fn request_fresh_cover(&self) -> Option<SearchHandle> {
        if !self.window_shown() {
            return None;
        }

        if self.player.state() != PlaybackState::Playing {
            self.display.show_cover(None);
            return None;
        }

        let Some(file) = self.player.current_file() else {
            self.display.show_cover(None);
            return None;
        };

        Some(self.manager.start_search(TrackInfo::from(file)))
    }

    /// Album art for a file other than the playing one.
    pub async fn album_art_for_file(&self, file: &HostFileInfo) -> Option<CoverArt> {
        self.manager.find_cover_image(&TrackInfo::from(file)).await
    }

    /// Album art for a location and tags, without a host file handle.
    pub async fn album_art_for(&self, file_url: &str, artist: &str, album: &str) -> Option<CoverArt> {
        self.manager
            .find_cover_image_for(file_url, artist, album)
            .await
    }

    /// Stop delivering results and persist the settings.
    pub fn shutdown(&self) -> Result<()> {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {}", e);
            return Err(e.into());
        }
        info!("Cover plugin shut down");
        Ok(())
    }

    fn window_shown(&self) -> bool {
        self.settings.window().enabled
    }
}

impl Drop for CoverPlugin {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().take() {
            pump.abort();
        }
    }
}

async fn deliver_results(
    mut events: broadcast::Receiver<FinderEvent>,
    manager: CoverFinderManager,
    settings: Arc<PluginSettings>,
    player: Arc<dyn Player>,
    display: Arc<dyn CoverDisplay>,
) {
    loop {
        match events.recv().await {
            Ok(FinderEvent::BeginRequest(request)) => {
                if manager.is_current(request) && settings.window().enabled {
                    display.begin_loading();
                }
            }
            Ok(FinderEvent::EndRequest { request, cover }) => {
                if !manager.is_current(request) {
                    debug!("Discarding result of superseded search {}", request);
                } else if !settings.window().enabled {
                    debug!("Cover window hidden, not applying result of search {}", request);
                } else if player.state() != PlaybackState::Playing {
                    debug!("Player stopped, not applying result of search {}", request);
                } else {
                    display.show_cover(cover);
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!("Missed {} cover search events", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
