//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `find`: One-off cover lookup for a file or stream
//! - `rules`: Listing and reordering the applied cover rules
//! - `config`: Config file location

mod config;
mod find;
mod rules;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::rules::CoverRuleKind;
use crate::settings::PluginSettings;

pub use config::cmd_config_path;
pub use find::{FindArgs, cmd_find};
pub use rules::{cmd_rules_list, cmd_rules_set};

/// Cover Scout CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "COVER_SCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings from `--config`, or the default config file.
    pub fn load_settings(&self) -> PluginSettings {
        match &self.config {
            Some(path) => PluginSettings::load_from(path),
            None => PluginSettings::load(),
        }
    }
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Find the cover for a track file or stream URL
    Find {
        /// Path to the track, or a stream URL
        location: String,
        /// Artist name
        #[arg(long)]
        artist: Option<String>,
        /// Album name
        #[arg(long)]
        album: Option<String>,
        /// Track title (default: file name without extension)
        #[arg(long)]
        title: Option<String>,
        /// Save the found image to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Last.fm API key (or set LASTFM_API_KEY env var)
        #[arg(long, env = "LASTFM_API_KEY")]
        api_key: Option<String>,
    },
    /// Show or change the cover rules
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List all rules in try-order
    List,
    /// Replace the applied rules, in the given order
    Set {
        /// Rule kinds: CoverFile, AlbumFile, LastFM, HostLibrary
        #[arg(required = true)]
        kinds: Vec<CoverRuleKind>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli, settings: PluginSettings) -> anyhow::Result<()> {
    let settings = Arc::new(settings);

    match &cli.command {
        Commands::Find {
            location,
            artist,
            album,
            title,
            output,
            api_key,
        } => {
            let rt = Runtime::new()?;
            let args = FindArgs {
                location,
                artist: artist.as_deref(),
                album: album.as_deref(),
                title: title.as_deref(),
                output: output.as_deref(),
                api_key: api_key.as_deref(),
            };
            cmd_find(&rt, settings, &args)
        }
        Commands::Rules {
            action: RulesCommand::List,
        } => cmd_rules_list(&settings),
        Commands::Rules {
            action: RulesCommand::Set { kinds },
        } => cmd_rules_set(&settings, kinds),
        Commands::Config {
            action: ConfigCommand::Path,
        } => cmd_config_path(&settings),
    }
}
