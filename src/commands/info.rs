use crate::discord::{Context, Error};
use crate::utils;
use poise::serenity_prelude as serenity;

const POLL_EMOJIS: [&str; 5] = ["🇦", "🇧", "🇨", "🇩", "🇪"];

/// Show help for all commands.
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let path = {
        let settings = ctx.data().settings.lock().await;
        settings.user_help_file()
    };

    match utils::load_text(&path).await {
        Ok(text) => {
            ctx.say(text).await?;
        }
        Err(e) => {
            log::warn!("Failed to read user help file: {}", e);
            ctx.say("Help text file not found.").await?;
        }
    }

    Ok(())
}

/// Check the bot's latency.
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("Pong! Latency is {}ms", latency.as_millis()))
        .await?;
    Ok(())
}

/// Get information about a user (yourself if none given).
#[poise::command(slash_command, prefix_command)]
pub async fn userinfo(
    ctx: Context<'_>,
    #[description = "User to look up"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let user = user.unwrap_or_else(|| ctx.author().clone());

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{}'s Info", user.name))
        .colour(serenity::Colour::BLUE)
        .field("Username", user.name.clone(), false)
        .field("ID", user.id.to_string(), false)
        .field(
            "Account Created",
            format!("<t:{}:D>", user.created_at().unix_timestamp()),
            false,
        );

    if let Some(guild_id) = ctx.guild_id() {
        if let Ok(member) = guild_id.member(ctx, user.id).await {
            if let Some(joined) = member.joined_at {
                embed = embed.field(
                    "Joined Server",
                    format!("<t:{}:D>", joined.unix_timestamp()),
                    false,
                );
            }

            let guild = guild_id.to_partial_guild(ctx.http()).await?;
            let roles = member
                .roles
                .iter()
                .filter_map(|id| guild.roles.get(id))
                .map(|role| role.name.clone())
                .collect::<Vec<_>>()
                .join(", ");
            if !roles.is_empty() {
                embed = embed.field("Roles", roles, false);
            }
        }
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Get information about the server.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn serverinfo(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = super::guild_of(&ctx)?;
    let guild = guild_id.to_partial_guild_with_counts(ctx.http()).await?;

    let mut roles = guild
        .roles
        .values()
        .map(|role| role.name.clone())
        .collect::<Vec<_>>()
        .join(", ");
    // Embed fields cap out at 1024 characters.
    if roles.len() > 1024 {
        roles.truncate(1021);
        roles.push_str("...");
    }

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{} Server Info", guild.name))
        .colour(serenity::Colour::DARK_GREEN)
        .field("Server Name", guild.name.clone(), false)
        .field("Server ID", guild.id.to_string(), false)
        .field(
            "Total Members",
            guild.approximate_member_count.unwrap_or(0).to_string(),
            false,
        )
        .field(
            "Server Created",
            format!("<t:{}:D>", guild.id.created_at().unix_timestamp()),
            false,
        );
    if !roles.is_empty() {
        embed = embed.field("Roles", roles, false);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Create a poll with up to 5 options.
#[poise::command(slash_command, prefix_command)]
pub async fn vote(
    ctx: Context<'_>,
    #[description = "Poll question"] question: String,
    #[description = "First option"] option1: String,
    #[description = "Second option"] option2: String,
    #[description = "Third option"] option3: Option<String>,
    #[description = "Fourth option"] option4: Option<String>,
    #[description = "Fifth option"] option5: Option<String>,
) -> Result<(), Error> {
    let options: Vec<String> = [Some(option1), Some(option2), option3, option4, option5]
        .into_iter()
        .flatten()
        .collect();

    let mut poll = format!("**Poll**: {}\n\n", question);
    for (emoji, option) in POLL_EMOJIS.iter().zip(&options) {
        poll.push_str(&format!("{}: {}\n", emoji, option));
    }

    let reply = ctx.say(format!("**Poll started!** {}", poll)).await?;
    let message = reply.message().await?;
    for emoji in POLL_EMOJIS.iter().take(options.len()) {
        message
            .react(ctx, serenity::ReactionType::Unicode(emoji.to_string()))
            .await?;
    }

    Ok(())
}

/// Show the bot's uptime and latency.
#[poise::command(slash_command, prefix_command)]
pub async fn uptime(ctx: Context<'_>) -> Result<(), Error> {
    let uptime = ctx.data().started.elapsed();
    let latency = ctx.ping().await;

    let embed = serenity::CreateEmbed::new()
        .title("Bot Status")
        .colour(serenity::Colour::PURPLE)
        .field("Uptime", utils::human_duration(uptime), false)
        .field("Latency", format!("{}ms", latency.as_millis()), false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
