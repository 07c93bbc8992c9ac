//! Cover search orchestration.
//!
//! [`CoverFinderManager`] runs one logical "find the cover" operation per
//! trigger: it stamps the search with a fresh request id (superseding any
//! older search), walks the applied rules in order, asks the matching finder
//! for each, and stops at the first image.
//!
//! Results are announced through [`FinderEvent`]s. A consumer that only
//! applies `EndRequest`s whose id is still current never shows the result
//! of a superseded search, even when that search finishes last.
//!
//! # Isolation
//!
//! A finder that errors or panics only loses its own turn: the failure is
//! logged and the next rule is tried. The whole loop runs under one overall
//! deadline; running out of time is the same as finding nothing.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::finder::FinderRegistry;
use super::request::{RequestId, RequestToken, RequestTracker};
use super::CoverArt;
use crate::rules::{FindRule, RuleProvider};
use crate::track::TrackInfo;

/// Marks the end of one resolution attempt in the log.
pub const SEPARATOR: &str = "------------------------------------------------------";

/// Overall deadline for one search unless configured otherwise.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 16;

/// Tuning for the resolution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Deadline for one whole search; `None` waits for every finder.
    pub timeout: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_SEARCH_TIMEOUT),
        }
    }
}

/// Lifecycle notifications of playback searches.
#[derive(Debug, Clone)]
pub enum FinderEvent {
    /// A search started.
    BeginRequest(RequestId),
    /// A search finished, with the cover it found.
    EndRequest {
        request: RequestId,
        cover: Option<CoverArt>,
    },
}

/// Handle to a running playback search.
#[derive(Debug)]
pub struct SearchHandle {
    id: RequestId,
    task: JoinHandle<Option<CoverArt>>,
}

impl SearchHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the search to finish. An aborted search yields `None`.
    pub async fn wait(self) -> Option<CoverArt> {
        match self.task.await {
            Ok(cover) => cover,
            Err(e) => {
                debug!("Search {} did not complete: {}", self.id, e);
                None
            }
        }
    }

    /// Stop the search task. No `EndRequest` is sent for it.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Runs cover searches against the registered finders.
///
/// Cheap to clone; clones share the request counter and event channel.
#[derive(Clone)]
pub struct CoverFinderManager {
    inner: Arc<Inner>,
}

struct Inner {
    finders: FinderRegistry,
    rules: Arc<dyn RuleProvider>,
    requests: RequestTracker,
    events: broadcast::Sender<FinderEvent>,
    options: SearchOptions,
    runtime: Handle,
}

impl CoverFinderManager {
    /// Searches are spawned on `runtime`, which also serves the blocking
    /// wrappers for callers outside of it.
    pub fn new(
        finders: FinderRegistry,
        rules: Arc<dyn RuleProvider>,
        options: SearchOptions,
        runtime: Handle,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                finders,
                rules,
                requests: RequestTracker::new(),
                events,
                options,
                runtime,
            }),
        }
    }

    /// Receive [`FinderEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FinderEvent> {
        self.inner.events.subscribe()
    }

    /// The most recently started playback search.
    pub fn current_request(&self) -> Option<RequestId> {
        self.inner.requests.current()
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.inner.requests.is_current(id)
    }

    pub fn finders(&self) -> &FinderRegistry {
        &self.inner.finders
    }

    /// Options the next search will run with.
    pub fn options(&self) -> SearchOptions {
        self.inner.options()
    }

    /// Runtime that searches are spawned on.
    pub fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Start a playback search for `track`, superseding any running one.
    ///
    /// `BeginRequest` is sent before this returns; `EndRequest` follows when
    /// the search finishes, whether or not anything was found.
    pub fn start_search(&self, track: TrackInfo) -> SearchHandle {
        let token = self.inner.requests.begin();
        let id = token.id();
        debug!("Starting cover search {}", id);

        // No subscribers is fine; the events are fire-and-forget.
        let _ = self.inner.events.send(FinderEvent::BeginRequest(id));

        let inner = Arc::clone(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            let cover = inner.search(&track, &token).await;
            let _ = inner.events.send(FinderEvent::EndRequest {
                request: id,
                cover: cover.clone(),
            });
            cover
        });

        SearchHandle { id, task }
    }

    /// One-off lookup for a specific track.
    ///
    /// Independent of playback searches: it neither supersedes them nor is
    /// superseded by them, and sends no events.
    pub async fn find_cover_image(&self, track: &TrackInfo) -> Option<CoverArt> {
        let tracker = RequestTracker::new();
        let token = tracker.begin();
        self.inner.search(track, &token).await
    }

    /// [`find_cover_image`](Self::find_cover_image) for a location and tags.
    pub async fn find_cover_image_for(
        &self,
        file_url: &str,
        artist: &str,
        album: &str,
    ) -> Option<CoverArt> {
        let track = TrackInfo::from_triplet(file_url, artist, album);
        self.find_cover_image(&track).await
    }

    /// Blocking [`find_cover_image`](Self::find_cover_image) for host threads.
    ///
    /// The lookup runs on the manager's runtime. Must not be called from a
    /// task on a current-thread runtime, which would never get to run it.
    pub fn find_cover_image_blocking(&self, track: &TrackInfo) -> Option<CoverArt> {
        let manager = self.clone();
        let track = track.clone();
        let task = self
            .inner
            .runtime
            .spawn(async move { manager.find_cover_image(&track).await });

        match futures::executor::block_on(task) {
            Ok(cover) => cover,
            Err(e) => {
                error!("Cover lookup task failed: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for CoverFinderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverFinderManager")
            .field("finders", &self.inner.finders)
            .field("current_request", &self.inner.requests.current())
            .field("options", &self.inner.options())
            .finish()
    }
}

impl Inner {
    fn options(&self) -> SearchOptions {
        self.rules.live_search_options().unwrap_or(self.options)
    }

    /// Resolution loop under the overall deadline.
    async fn search(&self, track: &TrackInfo, token: &RequestToken) -> Option<CoverArt> {
        let resolution = self.resolve(track, token);
        match self.options().timeout {
            Some(limit) => match tokio::time::timeout(limit, resolution).await {
                Ok(cover) => cover,
                Err(_) => {
                    warn!("Cover search {} timed out after {:?}", token.id(), limit);
                    debug!("{}", SEPARATOR);
                    None
                }
            },
            None => resolution.await,
        }
    }

    async fn resolve(&self, track: &TrackInfo, token: &RequestToken) -> Option<CoverArt> {
        if !token.is_current() {
            debug!("Search {} superseded before it started", token.id());
            return None;
        }

        debug!(
            "Search {}: album '{}', artist '{}', file '{}'",
            token.id(),
            track.album(),
            track.artist(),
            track.file_name()
        );

        let rules: Vec<FindRule> = self
            .rules
            .applied_rules()
            .into_iter()
            .filter(|rule| rule.enabled)
            .collect();

        let cover = if track.is_stream() {
            // Streams only ever get one shot, at the remote finder.
            match rules.iter().find(|rule| rule.is_remote()) {
                Some(rule) if token.is_current() => self.invoke(track, rule, token).await,
                Some(_) => None,
                None => {
                    debug!("No remote rule applied, nothing to search for a stream");
                    None
                }
            }
        } else {
            let mut found = None;
            for rule in &rules {
                if !token.is_current() {
                    debug!("Search {} superseded, stopping", token.id());
                    break;
                }
                if let Some(cover) = self.invoke(track, rule, token).await {
                    found = Some(cover);
                    break;
                }
            }
            found
        };

        debug!("{}", SEPARATOR);
        cover
    }

    /// Run one finder, containing any failure to this rule.
    async fn invoke(
        &self,
        track: &TrackInfo,
        rule: &FindRule,
        token: &RequestToken,
    ) -> Option<CoverArt> {
        let Some(finder) = self.finders.get(rule.module) else {
            warn!("No cover finder registered as '{}', skipping {}", rule.module, rule.kind);
            return None;
        };

        let outcome = AssertUnwindSafe(finder.find_cancellable(track, rule, token))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Some(cover))) => {
                info!(
                    "{}: found cover via {} ({}x{} {})",
                    rule.module, rule.kind, cover.width, cover.height, cover.mime_type
                );
                Some(cover)
            }
            Ok(Ok(None)) => {
                debug!("{}: no cover via {}", rule.module, rule.kind);
                None
            }
            Ok(Err(e)) => {
                warn!("{}: {} failed: {}", rule.module, rule.kind, e);
                None
            }
            Err(panic) => {
                error!(
                    "{}: {} panicked: {}",
                    rule.module,
                    rule.kind,
                    panic_message(panic.as_ref())
                );
                None
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
