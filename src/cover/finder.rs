//! The cover finder contract and the registry of known finders.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::CoverArt;
use super::request::RequestToken;
use crate::rules::{CoverRuleKind, FindRule};
use crate::track::TrackInfo;

/// Errors a finder can report.
///
/// None of these escape the resolution loop; they are logged and the next
/// rule is tried.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    /// The finder was handed a rule kind it does not implement.
    /// The rule table pairs kinds with modules, so this is a programming error.
    #[error("Rule {rule} cannot be handled by module {module}")]
    UnsupportedRule {
        module: &'static str,
        rule: CoverRuleKind,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Host album art service failed: {0}")]
    Host(String),
}

/// A strategy for locating artwork for a track.
///
/// Implementations hold no per-request state; any client handle they own is
/// created once and reused across calls.
#[async_trait]
pub trait CoverFinder: Send + Sync {
    /// Stable module name, matched against [`FindRule::module`].
    fn name(&self) -> &'static str;

    /// The rule kind this finder primarily serves.
    fn rule_kind(&self) -> CoverRuleKind;

    /// Look for a cover. `Ok(None)` means "nothing found".
    async fn find(
        &self,
        track: &TrackInfo,
        rule: &FindRule,
    ) -> Result<Option<CoverArt>, FinderError>;

    /// Like [`find`](Self::find), but may give up early once `token` is
    /// superseded. Finders with long waits override this.
    async fn find_cancellable(
        &self,
        track: &TrackInfo,
        rule: &FindRule,
        token: &RequestToken,
    ) -> Result<Option<CoverArt>, FinderError> {
        let _ = token;
        self.find(track, rule).await
    }
}

/// Static mapping from module name to finder instance, assembled once at
/// startup from the fixed list of strategies.
#[derive(Clone, Default)]
pub struct FinderRegistry {
    finders: HashMap<&'static str, Arc<dyn CoverFinder>>,
}

impl FinderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a finder under its own name, replacing any previous one.
    pub fn register(&mut self, finder: Arc<dyn CoverFinder>) -> &mut Self {
        self.finders.insert(finder.name(), finder);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, finder: Arc<dyn CoverFinder>) -> Self {
        self.register(finder);
        self
    }

    pub fn get(&self, module: &str) -> Option<Arc<dyn CoverFinder>> {
        self.finders.get(module).cloned()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.finders.contains_key(module)
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.finders.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }
}

impl std::fmt::Debug for FinderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderRegistry")
            .field("finders", &self.names())
            .finish()
    }
}
