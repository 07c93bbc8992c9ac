//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\cover-scout\config.toml
//! - macOS: ~/Library/Application Support/cover-scout/config.toml
//! - Linux: ~/.config/cover-scout/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded at
//! startup and saved when the plugin shuts down or the rules change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rules::{CoverRuleKind, RuleSet};

/// Plugin configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Floating cover window
    pub window: WindowConfig,

    /// Applied cover rules
    pub rules: RulesConfig,

    /// Search deadlines
    pub search: SearchConfig,

    /// Last.fm access
    pub lastfm: LastFmConfig,

    /// Diagnostics
    pub logging: LoggingConfig,
}

/// Cover window placement and behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Whether the window is shown
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub show_in_taskbar: bool,
    /// Resize with keyboard modifiers
    pub enable_hot_keys: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 500,
            height: 500,
            left: 10,
            top: 10,
            show_in_taskbar: false,
            enable_hot_keys: true,
        }
    }
}

/// Applied rules in try-order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule kinds by name, e.g. "CoverFile", "AlbumFile", "LastFM", "HostLibrary"
    pub applied: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            applied: RuleSet::new()
                .applied_kinds()
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
        }
    }
}

impl RulesConfig {
    /// Build the rule set, skipping names that don't parse.
    pub fn to_rule_set(&self) -> RuleSet {
        let kinds = self
            .applied
            .iter()
            .filter_map(|name| match name.parse::<CoverRuleKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::warn!("Ignoring configured rule: {}", e);
                    None
                }
            });
        RuleSet::with_applied(kinds)
    }

    pub fn from_rule_set(rules: &RuleSet) -> Self {
        Self {
            applied: rules
                .applied_kinds()
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
        }
    }
}

/// Search deadlines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Deadline for one complete search, 0 = none
    pub timeout_secs: u64,

    /// How long to wait for the host's album-art service
    pub host_library_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            host_library_timeout_secs: 20,
        }
    }
}

/// Last.fm API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastFmConfig {
    /// API key (empty disables remote lookups)
    pub api_key: String,

    pub base_url: String,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://ws.audioscrobbler.com/2.0/".to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Verbose logging to a file
    pub debug_mode: bool,

    /// Where the debug log goes (default: the config directory)
    pub log_dir: Option<PathBuf>,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cover-scout"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path, with the same fallbacks as [`load`].
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the default location
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to an explicit path
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Save configuration to `path` without blocking the async runtime
pub async fn save_async(config: Config, path: PathBuf) -> Result<(), ConfigError> {
    tokio::task::spawn_blocking(move || save_to(&config, &path))
        .await
        .map_err(|e| ConfigError::TaskJoin(e.to_string()))?
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

// ============================================================================
// Tests
// ============================================================================
