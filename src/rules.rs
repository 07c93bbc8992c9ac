//! Cover finding rules and their user-configurable order.
//!
//! Every supported (finder module, rule kind) pairing is fixed at compile
//! time. Users can only choose which of them are applied and in what order;
//! the applied list is the try-order of the resolution loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cover::{SearchOptions, host, local, remote};
use crate::error::Error;

/// The kind of lookup a rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverRuleKind {
    /// `cover.*` next to the track
    CoverFile,
    /// Picture embedded in the file tags (not offered by any finder yet)
    FromTags,
    /// `<album>.*` next to the track
    AlbumFile,
    /// Remote metadata service
    #[serde(rename = "LastFM")]
    LastFm,
    /// The host player's own album-art service
    HostLibrary,
}

impl CoverRuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoverFile => "CoverFile",
            Self::FromTags => "FromTags",
            Self::AlbumFile => "AlbumFile",
            Self::LastFm => "LastFM",
            Self::HostLibrary => "HostLibrary",
        }
    }

    /// Human readable description for option dialogs and CLI listings.
    pub fn description(&self) -> &'static str {
        match self {
            Self::CoverFile => "Image file named \"cover\" in the track folder",
            Self::FromTags => "Picture stored in the track tags",
            Self::AlbumFile => "Image file named after the album in the track folder",
            Self::LastFm => "Last.fm album, track or artist image",
            Self::HostLibrary => "Player's built-in album art",
        }
    }
}

impl fmt::Display for CoverRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverRuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coverfile" => Ok(Self::CoverFile),
            "fromtags" => Ok(Self::FromTags),
            "albumfile" => Ok(Self::AlbumFile),
            "lastfm" => Ok(Self::LastFm),
            "hostlibrary" => Ok(Self::HostLibrary),
            _ => Err(Error::UnknownRule(s.to_string())),
        }
    }
}

/// One (finder module, rule kind) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindRule {
    /// Name of the finder that handles this rule
    pub module: &'static str,
    pub kind: CoverRuleKind,
    pub enabled: bool,
}

impl FindRule {
    pub(crate) const fn new(module: &'static str, kind: CoverRuleKind) -> Self {
        Self {
            module,
            kind,
            enabled: true,
        }
    }

    /// All rules the crate supports, enabled, in default order.
    pub fn available() -> [FindRule; 4] {
        [
            FindRule::new(local::MODULE_NAME, CoverRuleKind::CoverFile),
            FindRule::new(local::MODULE_NAME, CoverRuleKind::AlbumFile),
            FindRule::new(remote::MODULE_NAME, CoverRuleKind::LastFm),
            FindRule::new(host::MODULE_NAME, CoverRuleKind::HostLibrary),
        ]
    }

    /// Whether this rule is served by the remote metadata finder.
    pub fn is_remote(&self) -> bool {
        self.module == remote::MODULE_NAME
    }
}

impl fmt::Display for FindRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.module)
    }
}

/// Source of the live, ordered list of enabled rules.
pub trait RuleProvider: Send + Sync {
    /// Enabled rules in try-order.
    fn applied_rules(&self) -> Vec<FindRule>;

    /// Search tuning read at the start of every search. `None` keeps the
    /// options the manager was built with.
    fn live_search_options(&self) -> Option<SearchOptions> {
        None
    }
}

/// The canonical rule table plus the user's applied order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<FindRule>,
    applied: Vec<CoverRuleKind>,
}

impl RuleSet {
    /// Canonical table with every rule applied in default order.
    pub fn new() -> Self {
        let rules = FindRule::available().to_vec();
        let applied = rules.iter().map(|r| r.kind).collect();
        Self { rules, applied }
    }

    /// Canonical table with the given kinds applied in the given order.
    ///
    /// Kinds without a rule in the table and repeated kinds are ignored.
    pub fn with_applied(kinds: impl IntoIterator<Item = CoverRuleKind>) -> Self {
        let mut set = Self {
            rules: FindRule::available().to_vec(),
            applied: Vec::new(),
        };
        for kind in kinds {
            if !set.add(kind) {
                tracing::warn!("Ignoring rule {} (unsupported or duplicate)", kind);
            }
        }
        set.sync_enabled();
        set
    }

    /// Every supported rule, with its current enabled flag.
    pub fn available(&self) -> &[FindRule] {
        &self.rules
    }

    /// Applied rule kinds in try-order.
    pub fn applied_kinds(&self) -> &[CoverRuleKind] {
        &self.applied
    }

    /// Applied rules in try-order.
    pub fn applied(&self) -> Vec<FindRule> {
        self.applied
            .iter()
            .filter_map(|kind| self.rule(*kind))
            .collect()
    }

    /// Rule for the given kind, if the table has one.
    pub fn rule(&self, kind: CoverRuleKind) -> Option<FindRule> {
        self.rules.iter().find(|r| r.kind == kind).copied()
    }

    /// Append a rule to the end of the try-order.
    ///
    /// Returns false if the kind is unsupported or already applied.
    pub fn add(&mut self, kind: CoverRuleKind) -> bool {
        if self.rule(kind).is_none() || self.applied.contains(&kind) {
            return false;
        }
        self.applied.push(kind);
        self.sync_enabled();
        true
    }

    /// Remove a rule from the try-order. Returns false if it was not applied.
    pub fn remove(&mut self, kind: CoverRuleKind) -> bool {
        let before = self.applied.len();
        self.applied.retain(|k| *k != kind);
        self.sync_enabled();
        self.applied.len() != before
    }

    /// Enable (append) or disable (remove) a rule.
    pub fn set_enabled(&mut self, kind: CoverRuleKind, enabled: bool) -> bool {
        if enabled {
            self.add(kind)
        } else {
            self.remove(kind)
        }
    }

    /// Move an applied rule to a new position, clamped to the list bounds.
    pub fn move_rule(&mut self, kind: CoverRuleKind, position: usize) -> bool {
        let Some(from) = self.applied.iter().position(|k| *k == kind) else {
            return false;
        };
        let kind = self.applied.remove(from);
        let to = position.min(self.applied.len());
        self.applied.insert(to, kind);
        true
    }

    fn sync_enabled(&mut self) {
        for rule in &mut self.rules {
            rule.enabled = self.applied.contains(&rule.kind);
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleProvider for RuleSet {
    fn applied_rules(&self) -> Vec<FindRule> {
        self.applied()
    }
}
