//! Request identity and supersession.
//!
//! Every search is stamped with a [`RequestId`] taken from a monotonically
//! increasing generation counter. Starting a new search bumps the counter,
//! which invalidates every older [`RequestToken`]. Cancellation is
//! cooperative: the resolution loop polls [`RequestToken::is_current`] at
//! well-defined points, and long waits can `select!` on
//! [`RequestToken::superseded`]. In-flight I/O of an old request is never
//! interrupted; its result is simply discarded.

use std::fmt;

use tokio::sync::watch;

/// Opaque identity of one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues request ids and tracks which one is current.
#[derive(Debug)]
pub struct RequestTracker {
    current: watch::Sender<u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        let (current, _) = watch::channel(0);
        Self { current }
    }

    /// Mint a new request, superseding every earlier one.
    pub fn begin(&self) -> RequestToken {
        let mut id = 0;
        self.current.send_modify(|generation| {
            *generation += 1;
            id = *generation;
        });
        RequestToken {
            id: RequestId(id),
            current: self.current.subscribe(),
        }
    }

    /// The most recently issued request, if any.
    pub fn current(&self) -> Option<RequestId> {
        match *self.current.borrow() {
            0 => None,
            id => Some(RequestId(id)),
        }
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.current() == Some(id)
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle carried by one search through the resolution loop.
#[derive(Debug, Clone)]
pub struct RequestToken {
    id: RequestId,
    current: watch::Receiver<u64>,
}

impl RequestToken {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Whether no newer request has been started since this one.
    pub fn is_current(&self) -> bool {
        *self.current.borrow() == self.id.0
    }

    /// Resolves once a newer request has been started, or the tracker is gone.
    pub async fn superseded(&self) {
        let mut current = self.current.clone();
        let id = self.id.0;
        // Err means the tracker was dropped; nothing can be current any more.
        let _ = current.wait_for(|generation| *generation != id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_no_request_initially() {
        let tracker = RequestTracker::new();
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_new_request_supersedes_old() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        assert!(first.is_current());

        let second = tracker.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_ne!(first.id(), second.id());
        assert!(tracker.is_current(second.id()));
        assert!(!tracker.is_current(first.id()));
    }

    #[test]
    fn test_ids_are_increasing() {
        let tracker = RequestTracker::new();
        let ids: Vec<_> = (0..5).map(|_| tracker.begin().id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_superseded_resolves_on_new_request() {
        let tracker = RequestTracker::new();
        let token = tracker.begin();

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.superseded().await }
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        tracker.begin();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("superseded() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_superseded_resolves_when_tracker_dropped() {
        let tracker = RequestTracker::new();
        let token = tracker.begin();
        drop(tracker);

        tokio::time::timeout(Duration::from_secs(1), token.superseded())
            .await
            .expect("superseded() should resolve once the tracker is gone");
    }
}
