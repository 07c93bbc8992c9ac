//! Live plugin settings.
//!
//! [`PluginSettings`] is the single shared copy of the configuration while
//! the plugin runs. The resolution loop reads the applied rules from it on
//! every search, so reordering rules or changing the search timeout takes
//! effect with the next track.

use std::path::PathBuf;
use std::time::Duration;

use parking_lot::RwLock;

use crate::config::{self, Config, ConfigError, LastFmConfig, LoggingConfig, RulesConfig, WindowConfig};
use crate::cover::SearchOptions;
use crate::rules::{FindRule, RuleProvider, RuleSet};

#[derive(Debug)]
struct State {
    config: Config,
    rules: RuleSet,
}

/// Shared, persisted settings.
#[derive(Debug)]
pub struct PluginSettings {
    /// Config file; `None` means the default location
    path: Option<PathBuf>,
    state: RwLock<State>,
}

impl PluginSettings {
    /// Load from the default config file.
    pub fn load() -> Self {
        Self::from_config(config::load(), None)
    }

    /// Load from an explicit config file, which is also where `save` writes.
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::from_config(config::load_from(&path), Some(path))
    }

    pub fn from_config(config: Config, path: Option<PathBuf>) -> Self {
        let rules = config.rules.to_rule_set();
        Self {
            path,
            state: RwLock::new(State { config, rules }),
        }
    }

    /// Where `save` writes, if it can be determined.
    pub fn path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(config::config_path)
    }

    /// Snapshot of the full configuration, rules included.
    pub fn config(&self) -> Config {
        let state = self.state.read();
        let mut config = state.config.clone();
        config.rules = RulesConfig::from_rule_set(&state.rules);
        config
    }

    pub fn rules(&self) -> RuleSet {
        self.state.read().rules.clone()
    }

    /// Change the rule set (add, remove, reorder, toggle).
    pub fn update_rules<R>(&self, f: impl FnOnce(&mut RuleSet) -> R) -> R {
        f(&mut self.state.write().rules)
    }

    pub fn window(&self) -> WindowConfig {
        self.state.read().config.window.clone()
    }

    pub fn set_window_enabled(&self, enabled: bool) {
        self.state.write().config.window.enabled = enabled;
    }

    pub fn lastfm(&self) -> LastFmConfig {
        self.state.read().config.lastfm.clone()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.state.read().config.logging.clone()
    }

    pub fn search_options(&self) -> SearchOptions {
        let secs = self.state.read().config.search.timeout_secs;
        SearchOptions {
            timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }

    /// Overall search deadline in seconds; `0` disables it.
    pub fn set_search_timeout(&self, secs: u64) {
        self.state.write().config.search.timeout_secs = secs;
    }

    pub fn host_library_timeout(&self) -> Duration {
        Duration::from_secs(self.state.read().config.search.host_library_timeout_secs)
    }

    /// Persist the current settings.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config = self.config();
        match &self.path {
            Some(path) => config::save_to(&config, path),
            None => config::save(&config),
        }
    }

    /// [`save`](Self::save) on the blocking pool.
    pub async fn save_async(&self) -> Result<(), ConfigError> {
        let path = self.path().ok_or(ConfigError::NoConfigDir)?;
        config::save_async(self.config(), path).await
    }

    #[cfg(test)]
    pub(crate) fn in_memory(config: Config, dir: &std::path::Path) -> Self {
        Self::from_config(config, Some(dir.join("config.toml")))
    }
}

impl RuleProvider for PluginSettings {
    fn applied_rules(&self) -> Vec<FindRule> {
        self.state.read().rules.applied()
    }

    fn live_search_options(&self) -> Option<SearchOptions> {
        Some(self.search_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CoverRuleKind;

    #[test]
    fn test_rules_follow_config_order() {
        let mut config = Config::default();
        config.rules.applied = vec!["LastFM".into(), "AlbumFile".into()];
        let settings = PluginSettings::from_config(config, None);

        let kinds: Vec<_> = settings.applied_rules().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![CoverRuleKind::LastFm, CoverRuleKind::AlbumFile]);
    }

    #[test]
    fn test_rule_changes_are_live() {
        let settings = PluginSettings::from_config(Config::default(), None);
        settings.update_rules(|rules| {
            rules.remove(CoverRuleKind::HostLibrary);
            rules.move_rule(CoverRuleKind::LastFm, 0);
        });

        let kinds: Vec<_> = settings.applied_rules().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CoverRuleKind::LastFm,
                CoverRuleKind::CoverFile,
                CoverRuleKind::AlbumFile
            ]
        );
        assert_eq!(settings.config().rules.applied, vec!["LastFM", "CoverFile", "AlbumFile"]);
    }

    #[test]
    fn test_search_options() {
        let mut config = Config::default();
        config.search.timeout_secs = 0;
        config.search.host_library_timeout_secs = 3;
        let settings = PluginSettings::from_config(config, None);

        assert_eq!(settings.search_options().timeout, None);
        assert_eq!(settings.host_library_timeout(), Duration::from_secs(3));

        let defaults = PluginSettings::from_config(Config::default(), None);
        assert_eq!(defaults.search_options().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PluginSettings::in_memory(Config::default(), dir.path());
        settings.set_window_enabled(false);
        settings.update_rules(|rules| rules.remove(CoverRuleKind::CoverFile));
        settings.save().unwrap();

        let reloaded = PluginSettings::load_from(dir.path().join("config.toml"));
        assert!(!reloaded.window().enabled);
        assert!(reloaded.rules().rule(CoverRuleKind::CoverFile).is_some_and(|r| !r.enabled));
    }

    #[tokio::test]
    async fn test_save_async() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PluginSettings::in_memory(Config::default(), dir.path());
        settings.save_async().await.unwrap();
        assert!(dir.path().join("config.toml").exists());
    }
}
