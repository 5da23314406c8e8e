use crate::audit;
use crate::discord::{Context, Error};
use crate::utils;
use poise::serenity_prelude as serenity;

/// Re-register the slash command set against this guild.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn sync(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let guild_id = super::guild_of(&ctx)?;

    let commands = &ctx.framework().options().commands;
    poise::builtins::register_in_guild(ctx.http(), commands, guild_id).await?;

    ctx.say(format!("✅ Synced {} commands.", commands.len()))
        .await?;
    audit::record(&ctx, "Synced commands", &guild_id.to_string(), "").await;
    Ok(())
}

/// Set the bot's playing status.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn status(
    ctx: Context<'_>,
    #[description = "New presence text"] status: String,
) -> Result<(), Error> {
    ctx.serenity_context()
        .set_activity(Some(serenity::ActivityData::playing(status.clone())));

    ctx.say(format!("✅ Status updated to: {}", status)).await?;
    audit::record(
        &ctx,
        "Changed status",
        "bot",
        &format!("New status: {}", status),
    )
    .await;
    Ok(())
}

/// Send the list of admin commands and their usage.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn adminhelp(ctx: Context<'_>) -> Result<(), Error> {
    let path = {
        let settings = ctx.data().settings.lock().await;
        settings.admin_help_file()
    };

    match utils::load_text(&path).await {
        Ok(text) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "Here is the list of admin commands:\n```\n{}\n```",
                        text
                    ))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => {
            log::warn!("Failed to read admin help file: {}", e);
            ctx.say("❌ Could not find the admin commands file.").await?;
        }
    }

    Ok(())
}
