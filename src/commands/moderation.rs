use crate::audit;
use crate::discord::{Context, Error};
use crate::utils;
use crate::warnings;
use poise::serenity_prelude as serenity;
use std::time::Duration;

fn until_from_now(duration: Duration) -> Result<serenity::Timestamp, Error> {
    let out_of_range = || Error::Validation("Duration is out of range.".to_string());

    // Values that parse fine can still exceed what a timestamp holds.
    let secs = i64::try_from(duration.as_secs()).map_err(|_| out_of_range())?;
    let delta = chrono::Duration::try_seconds(secs).ok_or_else(out_of_range)?;
    let until = chrono::Utc::now()
        .checked_add_signed(delta)
        .ok_or_else(out_of_range)?;
    serenity::Timestamp::from_unix_timestamp(until.timestamp()).map_err(|_| out_of_range())
}

/// Delete a specified number of recent messages from this channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "Number of messages to delete"]
    #[min = 1]
    #[max = 100]
    amount: u8,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let messages = ctx
        .channel_id()
        .messages(ctx.http(), serenity::GetMessages::new().limit(amount))
        .await?;
    let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();

    match ids.len() {
        0 => {}
        // Bulk delete needs at least two messages.
        1 => ctx.channel_id().delete_message(ctx.http(), ids[0]).await?,
        _ => ctx.channel_id().delete_messages(ctx.http(), &ids).await?,
    }

    ctx.say(format!("🧹 Deleted {} messages.", ids.len()))
        .await?;
    audit::record(
        &ctx,
        "Purged messages",
        &ctx.channel_id().to_string(),
        &format!("Amount: {}", ids.len()),
    )
    .await;
    Ok(())
}

/// Ban a user from the server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: serenity::User,
    #[description = "Reason for the ban"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = super::guild_of(&ctx)?;
    let reason = reason.as_deref().unwrap_or("No reason given");

    guild_id
        .ban_with_reason(ctx.http(), user.id, 0, reason)
        .await?;

    ctx.say(format!("✅ {} has been banned.", user.tag()))
        .await?;
    audit::record(&ctx, "Banned user", &user.tag(), reason).await;
    Ok(())
}

/// Kick a user from the server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "User to kick"] user: serenity::User,
    #[description = "Reason for the kick"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = super::guild_of(&ctx)?;
    let reason = reason.as_deref().unwrap_or("No reason given");

    guild_id
        .kick_with_reason(ctx.http(), user.id, reason)
        .await?;

    ctx.say(format!("✅ {} has been kicked.", user.tag()))
        .await?;
    audit::record(&ctx, "Kicked user", &user.tag(), reason).await;
    Ok(())
}

/// Unban a user from the server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User to unban"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = super::guild_of(&ctx)?;

    guild_id.unban(ctx.http(), user.id).await?;

    ctx.say(format!("✅ {} has been unbanned.", user.tag()))
        .await?;
    audit::record(&ctx, "Unbanned user", &user.tag(), "").await;
    Ok(())
}

/// Put a member in timeout for a duration like `1d 2h 30m`.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "Member to time out"] mut member: serenity::Member,
    #[description = "Duration, e.g. `1d 2h 30m`"] duration: String,
) -> Result<(), Error> {
    // Validation failures are reported before any platform call.
    let total = match utils::parse_duration(&duration) {
        Ok(total) if !total.is_zero() => total,
        Ok(_) => {
            ctx.say("❌ Invalid time format. Example: `1d 2h 30m`")
                .await?;
            return Ok(());
        }
        Err(e) => {
            ctx.say(format!("❌ {} Example: `1d 2h 30m`", e)).await?;
            return Ok(());
        }
    };

    let until = until_from_now(total)?;
    member
        .disable_communication_until_datetime(ctx.http(), until)
        .await?;

    let human = utils::human_duration(total);
    ctx.say(format!(
        "✅ {} has been timed out for {}.",
        member.user.tag(),
        human
    ))
    .await?;
    audit::record(
        &ctx,
        "Timed out user",
        &member.user.tag(),
        &format!("Duration: {}", human),
    )
    .await;
    Ok(())
}

/// Remove the timeout from a member.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn clear_timeout(
    ctx: Context<'_>,
    #[description = "Member to release"] mut member: serenity::Member,
) -> Result<(), Error> {
    let timed_out = member
        .communication_disabled_until
        .map(|until| until.unix_timestamp() > serenity::Timestamp::now().unix_timestamp())
        .unwrap_or(false);

    if !timed_out {
        ctx.say(format!(
            "❌ {} is not currently timed out.",
            member.user.tag()
        ))
        .await?;
        return Ok(());
    }

    member.enable_communication(ctx.http()).await?;

    ctx.say(format!(
        "✅ {}'s timeout has been cleared.",
        member.user.tag()
    ))
    .await?;
    audit::record(&ctx, "Cleared timeout", &member.user.tag(), "").await;
    Ok(())
}

/// Warn a user. Three or more warnings trigger an automatic timeout.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "User to warn"] user: serenity::User,
) -> Result<(), Error> {
    let key = user.id.to_string();
    let outcome = {
        let mut store = ctx.data().warnings.lock().await;
        warnings::warn(&mut store, &key).await?
    };

    if outcome.escalate {
        let guild_id = super::guild_of(&ctx)?;
        let mut member = guild_id.member(ctx, user.id).await?;
        let until = until_from_now(warnings::SUSPENSION)?;
        member
            .disable_communication_until_datetime(ctx.http(), until)
            .await?;

        ctx.say(format!(
            "⚠️ {} has been warned {} times and automatically timed out.",
            user.tag(),
            outcome.count
        ))
        .await?;
    } else {
        ctx.say(format!(
            "⚠️ {} has been warned. Total warnings: {}.",
            user.tag(),
            outcome.count
        ))
        .await?;
    }

    audit::record(
        &ctx,
        "Warned user",
        &user.tag(),
        &format!("Total warnings: {}", outcome.count),
    )
    .await;
    Ok(())
}

/// Check the warning count of a user.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn warnings(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let count = {
        let store = ctx.data().warnings.lock().await;
        warnings::get(&store, &user.id.to_string())
    };

    ctx.say(format!("⚠️ {} has {} warnings.", user.tag(), count))
        .await?;
    Ok(())
}

/// Remove a number of warnings from a user.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn remove_warning(
    ctx: Context<'_>,
    #[description = "User to clear"] user: serenity::User,
    #[description = "How many warnings to remove"]
    #[min = 1]
    count: u32,
) -> Result<(), Error> {
    let remaining = {
        let mut store = ctx.data().warnings.lock().await;
        warnings::remove_warnings(&mut store, &user.id.to_string(), count).await?
    };

    ctx.say(format!(
        "✅ Removed {} warnings from {}. Remaining: {}.",
        count,
        user.tag(),
        remaining
    ))
    .await?;
    audit::record(
        &ctx,
        "Removed warning",
        &user.tag(),
        &format!("Warnings removed: {} - Remaining: {}", count, remaining),
    )
    .await;
    Ok(())
}

/// Remove a role from every member holding it.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn clear_roles(
    ctx: Context<'_>,
    #[description = "Role to clear"] role: serenity::Role,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let guild_id = super::guild_of(&ctx)?;

    let members = guild_id.members(ctx.http(), None, None).await?;
    let mut count = 0u32;
    for member in &members {
        if member.roles.contains(&role.id) {
            member.remove_role(ctx.http(), role.id).await?;
            count += 1;
        }
    }

    ctx.say(format!(
        "🧼 Removed role '{}' from {} users.",
        role.name, count
    ))
    .await?;
    audit::record(
        &ctx,
        "Cleared role",
        &role.name,
        &format!("Count: {}", count),
    )
    .await;
    Ok(())
}

/// Restore a user's previously held role from the ranks store.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    check = "crate::checks::is_staff"
)]
pub async fn restore_role(
    ctx: Context<'_>,
    #[description = "User to restore"] user: serenity::User,
) -> Result<(), Error> {
    let role_id = {
        let ranks = ctx.data().ranks.lock().await;
        ranks.get(&user.id.to_string()).copied().filter(|id| *id != 0)
    };
    let Some(role_id) = role_id else {
        ctx.say("❌ No role data found for this user.").await?;
        return Ok(());
    };

    let guild_id = super::guild_of(&ctx)?;
    let guild = guild_id.to_partial_guild(ctx.http()).await?;
    let Some(role) = guild.roles.get(&serenity::RoleId::new(role_id)) else {
        ctx.say("❌ Role not found.").await?;
        return Ok(());
    };

    guild_id
        .member(ctx, user.id)
        .await?
        .add_role(ctx.http(), role.id)
        .await?;

    ctx.say(format!("✅ Restored {} role to {}.", role.name, user.tag()))
        .await?;
    audit::record(
        &ctx,
        "Restored role",
        &user.tag(),
        &format!("Role: {}", role.name),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_duration_converts() {
        assert!(until_from_now(Duration::from_secs(3600)).is_ok());
    }

    #[test]
    fn extreme_duration_is_rejected_not_panicking() {
        // Parses fine as seconds but exceeds what a timestamp can hold.
        let total = utils::parse_duration("106000000000000d").unwrap();
        assert!(matches!(
            until_from_now(total),
            Err(Error::Validation(_))
        ));

        assert!(matches!(
            until_from_now(Duration::from_secs(u64::MAX)),
            Err(Error::Validation(_))
        ));
    }
}
