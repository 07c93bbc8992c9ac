//! Command-line interface for cover-scout.
//!
//! This module provides CLI commands for looking up covers and managing the
//! cover rules without a host player.

mod commands;

pub use commands::{Cli, Commands, ConfigCommand, RulesCommand, run_command};
