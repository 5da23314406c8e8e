use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const FILENAME: &str = "settings.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Discord's bot token
    pub token: String,
    /// Discord account id which owns the bot
    pub owner: u64,
    /// Command prefix
    pub prefix: String,
    /// Guild the slash commands get registered in
    pub guild_id: u64,
    /// Presence text shown while the bot is online
    pub activity: String,
    /// Directory holding the record stores and text documents
    pub data_dir: PathBuf,
    /// Name of the role granted when onboarding completes
    pub member_role: String,
    /// Name of the channel mirroring audit log lines
    pub audit_channel: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::from("DISCORD_BOT_TOKEN_HERE"),
            owner: 999999999,
            prefix: String::from("~"),
            guild_id: 999999999,
            activity: String::from("Serving Rogue Legion"),
            data_dir: PathBuf::from("data"),
            member_role: String::from("Member"),
            audit_channel: String::from("leave-messages"),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings_path = std::env::var("BOT_SETTINGS").unwrap_or_else(|_| FILENAME.to_string());

        Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name(&settings_path))
            // Add in settings from the environment (with a prefix of BOT)
            // Eg.. `BOT_PREFIX=!` would set the `prefix` key
            .add_source(Environment::with_prefix("BOT"))
            .build()?
            .try_deserialize()
    }

    /// Path of the rules document sent to new members.
    pub fn rules_file(&self) -> PathBuf {
        self.data_dir.join("rules.txt")
    }

    /// Path of the user help document.
    pub fn user_help_file(&self) -> PathBuf {
        self.data_dir.join("usercommands.txt")
    }

    /// Path of the admin help document.
    pub fn admin_help_file(&self) -> PathBuf {
        self.data_dir.join("admincommands.txt")
    }

    /// Path of a record store file inside the data directory.
    pub fn store_path(&self, filename: &str) -> PathBuf {
        self.data_dir.join(filename)
    }

    pub async fn save(&self) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let settings_path = std::env::var("BOT_SETTINGS").unwrap_or_else(|_| FILENAME.to_string());

        if let Some(parent) = PathBuf::from(&settings_path).parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let mut file = tokio::fs::File::create(&settings_path).await?;
        file.write_all(
            serde_yaml::to_string(&self)
                .context("Failed to serialize settings")?
                .as_bytes(),
        )
        .await?;
        file.sync_all().await?;
        Ok(())
    }
}
