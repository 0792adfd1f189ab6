//! Configuration file commands.

use std::path::Path;

use droidlink_core::AppSettings;

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::util::create_config_manager;

/// Config command handler
pub fn cmd_config(config_path: Option<&Path>, subcmd: ConfigCommands) -> Result<(), CliError> {
    let manager = create_config_manager(config_path)?;

    match subcmd {
        ConfigCommands::Show => {
            let settings = manager.load_settings()?;
            let text = toml::to_string_pretty(&settings)
                .map_err(|e| CliError::Output(format!("Failed to render settings: {e}")))?;
            print!("{text}");
        }
        ConfigCommands::Path => println!("{}", manager.settings_path().display()),
        ConfigCommands::Init { force } => {
            let path = manager.settings_path();
            if path.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            manager.save_settings(&AppSettings::default())?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
