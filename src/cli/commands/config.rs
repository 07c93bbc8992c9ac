//! Config file helpers.

use crate::settings::PluginSettings;

/// Print where the config file lives
pub fn cmd_config_path(settings: &PluginSettings) -> anyhow::Result<()> {
    let path = settings
        .path()
        .ok_or(crate::config::ConfigError::NoConfigDir)?;
    println!("{}", path.display());
    if !path.exists() {
        println!("(not created yet, defaults in use)");
    }
    Ok(())
}
