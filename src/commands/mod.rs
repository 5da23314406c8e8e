pub mod admin;
pub mod info;
pub mod moderation;

use crate::discord::{Context, Data, Error};
use poise::serenity_prelude as serenity;

/// The full command registry, enumerated at compile time.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        moderation::purge(),
        moderation::ban(),
        moderation::kick(),
        moderation::unban(),
        moderation::timeout(),
        moderation::clear_timeout(),
        moderation::warn(),
        moderation::warnings(),
        moderation::remove_warning(),
        moderation::clear_roles(),
        moderation::restore_role(),
        admin::sync(),
        admin::status(),
        admin::adminhelp(),
        info::help(),
        info::ping(),
        info::userinfo(),
        info::serverinfo(),
        info::vote(),
        info::uptime(),
    ]
}

/// Guild of the invocation. Commands calling this are marked `guild_only`,
/// so a miss only happens on a misrouted prefix invocation.
pub(crate) fn guild_of(ctx: &Context<'_>) -> Result<serenity::GuildId, Error> {
    ctx.guild_id().ok_or_else(|| {
        Error::Validation("This command can only be used in a server.".to_string())
    })
}
