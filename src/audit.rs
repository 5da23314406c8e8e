use crate::discord::Context;
use crate::logger::AUDIT_TARGET;

/// Appends one audit line (action, actor, subject, detail) to the audit log
/// and mirrors it to the configured audit channel. A missing channel is
/// tolerated; mirror failures are logged but never fail the command.
pub async fn record(ctx: &Context<'_>, action: &str, subject: &str, detail: &str) {
    log::info!(
        target: AUDIT_TARGET,
        "Action: {} - Actor: {} - Subject: {} - Detail: {}",
        action,
        ctx.author().tag(),
        subject,
        detail
    );

    let Some(guild_id) = ctx.guild_id() else {
        return;
    };
    let channel_name = {
        let settings = ctx.data().settings.lock().await;
        settings.audit_channel.clone()
    };

    let channels = match guild_id.channels(ctx.http()).await {
        Ok(channels) => channels,
        Err(e) => {
            log::warn!("Failed to fetch channels for audit mirror: {}", e);
            return;
        }
    };

    if let Some(channel) = channels.values().find(|c| c.name == channel_name) {
        let line = format!("**{}**: {} | {}", action, subject, detail);
        if let Err(e) = channel.id.say(ctx.http(), line).await {
            log::warn!("Failed to mirror audit line to '{}': {}", channel_name, e);
        }
    }
}
