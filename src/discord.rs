use crate::commands;
use crate::onboarding;
use crate::settings::Settings;
use crate::store::{OnboardingRecord, RecordStore, ONBOARDING_FILE, RANKS_FILE, WARNINGS_FILE};
use anyhow::{Context as _, Result};
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Instant};
use tokio::sync::Mutex;

pub type Error = crate::error::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application context, constructed once at startup and handed to
/// every command and event handler. Each record store sits behind its own
/// mutex so mutations are serialized through a single writer.
pub struct Data {
    pub settings: Arc<Mutex<Settings>>,
    pub onboarding: Arc<Mutex<RecordStore<OnboardingRecord>>>,
    pub warnings: Arc<Mutex<RecordStore<u32>>>,
    pub ranks: Arc<Mutex<RecordStore<u64>>>,
    pub started: Instant,
}

pub async fn run(settings: Settings) -> Result<()> {
    let token = settings.token.clone();
    let guild_id = serenity::GuildId::new(settings.guild_id);
    let activity = settings.activity.clone();

    // A corrupt store is fatal at startup; treating it as empty would lose
    // every record on the next save.
    let onboarding_store = RecordStore::load(settings.store_path(ONBOARDING_FILE))
        .context("Failed to load onboarding store.")?;
    let warnings_store = RecordStore::load(settings.store_path(WARNINGS_FILE))
        .context("Failed to load warnings store.")?;
    let ranks_store =
        RecordStore::load(settings.store_path(RANKS_FILE)).context("Failed to load ranks store.")?;

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGE_REACTIONS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(settings.prefix.clone()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            event_handler: |ctx, event, _framework, data| Box::pin(handle_event(ctx, event, data)),
            pre_command: |ctx| {
                Box::pin(async move {
                    log::info!(
                        "Got command '{}' by user '{}'",
                        ctx.command().qualified_name,
                        ctx.author().tag()
                    );
                })
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                log::info!("Connected as {}", ready.user.name);

                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await?;
                log::info!(
                    "Synced {} slash commands to guild {}",
                    framework.options().commands.len(),
                    guild_id
                );

                ctx.set_activity(Some(serenity::ActivityData::playing(activity)));

                Ok(Data {
                    settings: Arc::new(Mutex::new(settings)),
                    onboarding: Arc::new(Mutex::new(onboarding_store)),
                    warnings: Arc::new(Mutex::new(warnings_store)),
                    ranks: Arc::new(Mutex::new(ranks_store)),
                    started: Instant::now(),
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    Ok(client.start().await?)
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            log::info!("'{}' joined, starting onboarding", new_member.user.tag());

            // The flow waits on the member for minutes; run it as its own
            // task so it never holds up event dispatch.
            let ctx = ctx.clone();
            let member = new_member.clone();
            let settings = data.settings.clone();
            let store = data.onboarding.clone();
            tokio::task::spawn(async move {
                if let Err(e) = onboarding::on_member_join(&ctx, &member, settings, store).await {
                    log::error!("Onboarding for '{}' failed: {}", member.user.tag(), e);
                }
            });
        }
        serenity::FullEvent::Resume { .. } => {
            log::info!("Connection to discord resumed.");
        }
        _ => {}
    }

    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            log::error!(
                "Command '{}' failed: {}",
                ctx.command().qualified_name,
                error
            );
            let _ = ctx.say(format!("❌ Error: {}", error)).await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            let _ = ctx.say(format!("❌ Invalid arguments: {}", error)).await;
        }
        e => {
            if let Err(e) = poise::builtins::on_error(e).await {
                log::warn!("Unhandled dispatch error. {:?}", e);
            }
        }
    }
}
