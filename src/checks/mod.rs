use crate::discord::Context;
use crate::discord::Error;

/// Role names (case-insensitive) allowed to run moderation commands.
pub const STAFF_ROLES: [&str; 3] = ["admin", "moderator", "founder"];

/// Checks whether the user holds a staff role (or owns the bot).
pub async fn is_staff(ctx: Context<'_>) -> Result<bool, Error> {
    let owner = {
        let settings = ctx.data().settings.lock().await;
        settings.owner
    };
    if owner == ctx.author().id.get() {
        return Ok(true);
    }

    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.")
            .await?;
        return Ok(false);
    };

    let member = guild_id.member(ctx, ctx.author().id).await?;
    let roles = guild_id.to_partial_guild(ctx).await?.roles;

    let allowed = member
        .roles
        .iter()
        .filter_map(|id| roles.get(id))
        .any(|role| {
            let name = role.name.to_lowercase();
            STAFF_ROLES.contains(&name.as_str())
        });

    if allowed {
        Ok(true)
    } else {
        ctx.say(format!("❌ {}", Error::PermissionDenied)).await?;
        Ok(false)
    }
}
