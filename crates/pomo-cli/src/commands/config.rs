use clap::Subcommand;
use pomo_core::Settings;

use super::Context;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "durations.pomodoro_min", "storage.backend")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the settings file location
    Path,
}

pub fn run(ctx: &Context, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => match ctx.settings.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            // Reload so a `--memory` override never leaks into the file.
            let mut settings = Settings::load_from(&ctx.settings_path)?;
            settings.set(&key, &value)?;
            settings.save_to(&ctx.settings_path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let json = serde_json::to_string_pretty(&ctx.settings)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            Settings::default().save_to(&ctx.settings_path)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => println!("{}", ctx.settings_path.display()),
    }
    Ok(())
}
