//! Cover art from the host player's built-in album-art service.
//!
//! The host API is callback based: a request is issued together with a
//! completion handle that the host fires later from one of its own threads.
//! [`HostLibraryFinder`] turns that into a bounded async call: a fresh
//! one-shot channel per lookup, raced against a timeout and against the
//! request being superseded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use super::finder::{CoverFinder, FinderError};
use super::request::RequestToken;
use super::{CoverArt, CoverSource};
use crate::rules::{CoverRuleKind, FindRule};
use crate::track::TrackInfo;

pub const MODULE_NAME: &str = "hostcoverart";

/// How long to wait for the host before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Completion handle passed to the host with every album-art request.
///
/// The host calls [`complete`](Self::complete) once with the encoded image
/// it found, or `None`. Dropping the handle without completing counts as
/// "no image".
#[derive(Debug)]
pub struct AlbumArtCompletion {
    sender: oneshot::Sender<Option<Vec<u8>>>,
}

impl AlbumArtCompletion {
    fn channel() -> (Self, oneshot::Receiver<Option<Vec<u8>>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    pub fn complete(self, image: Option<Vec<u8>>) {
        // The finder may already have timed out and gone away.
        let _ = self.sender.send(image);
    }
}

/// The host player's album-art service.
pub trait HostAlbumArt: Send + Sync {
    /// Start an asynchronous album-art lookup for `track`.
    ///
    /// Must return promptly; the result is delivered through `completion`.
    fn request_image(&self, track: &TrackInfo, completion: AlbumArtCompletion);
}

/// Delegates to the host's album-art service with a bounded wait.
pub struct HostLibraryFinder {
    service: Arc<dyn HostAlbumArt>,
    timeout: Duration,
}

impl HostLibraryFinder {
    pub fn new(service: Arc<dyn HostAlbumArt>) -> Self {
        Self::with_timeout(service, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(service: Arc<dyn HostAlbumArt>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the host for a cover, giving up after the timeout or as soon as
    /// `cancelled` resolves.
    pub async fn fetch<C>(&self, track: &TrackInfo, cancelled: C) -> Result<Option<CoverArt>, FinderError>
    where
        C: std::future::Future<Output = ()> + Send,
    {
        let (completion, receiver) = AlbumArtCompletion::channel();
        self.service.request_image(track, completion);

        let data = tokio::select! {
            result = receiver => match result {
                Ok(data) => data,
                Err(_) => {
                    debug!("Host dropped the album art request without answering");
                    None
                }
            },
            _ = tokio::time::sleep(self.timeout) => {
                debug!("Host album art lookup timed out after {:?}", self.timeout);
                None
            }
            _ = cancelled => {
                debug!("Host album art lookup abandoned: request superseded");
                None
            }
        };

        let Some(data) = data else {
            return Ok(None);
        };

        match CoverArt::decode(data, CoverSource::HostLibrary) {
            Ok(cover) => Ok(Some(cover)),
            Err(e) => Err(FinderError::Host(format!("undecodable image: {}", e))),
        }
    }
}

#[async_trait]
impl CoverFinder for HostLibraryFinder {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn rule_kind(&self) -> CoverRuleKind {
        CoverRuleKind::HostLibrary
    }

    async fn find(
        &self,
        track: &TrackInfo,
        _rule: &FindRule,
    ) -> Result<Option<CoverArt>, FinderError> {
        self.fetch(track, std::future::pending()).await
    }

    async fn find_cancellable(
        &self,
        track: &TrackInfo,
        _rule: &FindRule,
        token: &RequestToken,
    ) -> Result<Option<CoverArt>, FinderError> {
        self.fetch(track, token.superseded()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::RequestTracker;
    use crate::test_utils::png_bytes;
    use parking_lot::Mutex;

    /// Host that answers immediately from the calling thread.
    struct ImmediateHost(Option<Vec<u8>>);

    impl HostAlbumArt for ImmediateHost {
        fn request_image(&self, _track: &TrackInfo, completion: AlbumArtCompletion) {
            completion.complete(self.0.clone());
        }
    }

    /// Host that answers later from another thread.
    struct DelayedHost {
        delay: Duration,
        image: Vec<u8>,
    }

    impl HostAlbumArt for DelayedHost {
        fn request_image(&self, _track: &TrackInfo, completion: AlbumArtCompletion) {
            let delay = self.delay;
            let image = self.image.clone();
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                completion.complete(Some(image));
            });
        }
    }

    /// Host that keeps the completion handle and never answers.
    #[derive(Default)]
    struct SilentHost {
        pending: Mutex<Vec<AlbumArtCompletion>>,
    }

    impl HostAlbumArt for SilentHost {
        fn request_image(&self, _track: &TrackInfo, completion: AlbumArtCompletion) {
            self.pending.lock().push(completion);
        }
    }

    /// Host that drops the completion handle.
    struct ForgetfulHost;

    impl HostAlbumArt for ForgetfulHost {
        fn request_image(&self, _track: &TrackInfo, _completion: AlbumArtCompletion) {}
    }

    fn track() -> TrackInfo {
        TrackInfo::new("Radiohead", "OK Computer", "Airbag", "/music/01.flac")
    }

    fn rule() -> FindRule {
        FindRule::new(MODULE_NAME, CoverRuleKind::HostLibrary)
    }

    #[tokio::test]
    async fn test_immediate_answer() {
        let finder = HostLibraryFinder::new(Arc::new(ImmediateHost(Some(png_bytes(5, 5)))));
        let cover = finder.find(&track(), &rule()).await.unwrap().unwrap();
        assert_eq!(cover.source, CoverSource::HostLibrary);
        assert_eq!(cover.width, 5);
    }

    #[tokio::test]
    async fn test_host_reports_nothing() {
        let finder = HostLibraryFinder::new(Arc::new(ImmediateHost(None)));
        assert!(finder.find(&track(), &rule()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_answer_from_other_thread() {
        let host = DelayedHost {
            delay: Duration::from_millis(20),
            image: png_bytes(2, 2),
        };
        let finder = HostLibraryFinder::with_timeout(Arc::new(host), Duration::from_secs(5));
        assert!(finder.find(&track(), &rule()).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_none() {
        let host = Arc::new(SilentHost::default());
        let finder = HostLibraryFinder::new(host.clone());
        assert_eq!(finder.timeout(), DEFAULT_TIMEOUT);

        let result = finder.find(&track(), &rule()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(host.pending.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_completion_returns_none() {
        let finder = HostLibraryFinder::new(Arc::new(ForgetfulHost));
        assert!(finder.find(&track(), &rule()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_an_error() {
        let finder = HostLibraryFinder::new(Arc::new(ImmediateHost(Some(b"junk".to_vec()))));
        let result = finder.find(&track(), &rule()).await;
        assert!(matches!(result, Err(FinderError::Host(_))));
    }

    #[tokio::test]
    async fn test_supersession_abandons_wait() {
        let finder = HostLibraryFinder::with_timeout(
            Arc::new(SilentHost::default()),
            Duration::from_secs(3600),
        );
        let tracker = RequestTracker::new();
        let token = tracker.begin();
        let track = track();
        let rule = rule();

        let lookup = finder.find_cancellable(&track, &rule, &token);
        let (result, _) = tokio::join!(lookup, async {
            tokio::task::yield_now().await;
            tracker.begin();
        });
        assert!(result.unwrap().is_none());
    }
}
