/// Moderation audit trail
mod audit;
/// checks for permission to execute a specific command
pub mod checks;
/// All available discord commands
mod commands;
/// discord setup
mod discord;
/// Error taxonomy
mod error;
mod logger;
/// New member onboarding flow
mod onboarding;
/// Bot Settings
mod settings;
/// Persisted record stores (onboarding, warnings, ranks)
mod store;
mod utils;
/// Warning escalation policy
mod warnings;

use anyhow::{Context, Result};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    logger::init()?;

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(_) => {
            Settings::default()
                .save()
                .await
                .context("Failed to save default config.")?;
            println!("Created default settings. Please fill out. Exiting...");
            std::process::exit(0);
        }
    };

    discord::run(settings)
        .await
        .context("Failed to start discord.")
}
