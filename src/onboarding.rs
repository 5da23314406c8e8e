use crate::error::Error;
use crate::settings::Settings;
use crate::store::{OnboardingRecord, RecordStore};
use crate::utils;
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// How long a new member may take to react / reply at each step.
pub const WAIT_WINDOW: Duration = Duration::from_secs(120);
/// Discord's nickname length limit.
pub const MAX_GAMERTAG: usize = 32;
/// Reaction a member applies to the rules message to accept them.
pub const ACCEPT_MARKER: &str = "✅";

/// Terminal state of an onboarding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rules accepted, nickname set, role granted where available.
    Completed { gamertag: String },
    /// The member never reacted or replied, or a platform call failed.
    /// Nothing is persisted, so a later rejoin restarts the flow.
    Abandoned,
    /// The gamertag was too long; the member was told to contact a
    /// moderator. Nothing is persisted.
    Escalated,
}

/// The platform calls the onboarding flow needs. Commands talk to Discord
/// through [`DiscordPlatform`]; tests drive the flow with a mock.
#[serenity::async_trait]
pub trait Platform: Send {
    /// Delivers the rules privately with the accept marker attached.
    async fn send_rules(&mut self, text: &str) -> Result<(), Error>;
    async fn send_dm(&mut self, text: &str) -> Result<(), Error>;
    /// Waits for the member to apply the accept marker to the rules
    /// message. An elapsed window is [`Error::Timeout`].
    async fn await_rule_accept(&mut self, window: Duration) -> Result<(), Error>;
    /// Waits for the member's next private reply. An elapsed window is
    /// [`Error::Timeout`].
    async fn await_gamertag(&mut self, window: Duration) -> Result<String, Error>;
    async fn set_nickname(&mut self, nick: &str) -> Result<(), Error>;
    /// Grants the configured member role. `false` means the guild has no
    /// such role, which is not a failure.
    async fn grant_member_role(&mut self) -> Result<bool, Error>;
}

/// Whether a member should enter the onboarding flow. A record with
/// `completed == true` keeps the flow from being re-entered on rejoin.
pub fn needs_onboarding(store: &RecordStore<OnboardingRecord>, key: &str) -> bool {
    store.get(key).map_or(true, |record| !record.completed)
}

/// Drives a member through rule acceptance and nickname/role setup.
///
/// Platform failures abort the run as [`Outcome::Abandoned`]; the caller
/// only persists a record for [`Outcome::Completed`].
pub async fn run<P: Platform>(platform: &mut P, member_name: &str, rules: &str) -> Outcome {
    match drive(platform, member_name, rules).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("Onboarding for '{}' aborted: {}", member_name, e);
            Outcome::Abandoned
        }
    }
}

async fn drive<P: Platform>(
    platform: &mut P,
    member_name: &str,
    rules: &str,
) -> Result<Outcome, Error> {
    platform
        .send_rules(&format!(
            "Welcome {}! Please review the server rules and guidelines:\n\n{}\n\n\
             Please react with {} if you accept the rules.",
            member_name, rules, ACCEPT_MARKER
        ))
        .await?;

    // An expired wait ends the flow silently; anything else aborts it.
    match platform.await_rule_accept(WAIT_WINDOW).await {
        Ok(()) => {}
        Err(Error::Timeout) => return Ok(Outcome::Abandoned),
        Err(e) => return Err(e),
    }

    platform
        .send_dm(
            "Thank you for accepting the rules! Please tell me your gamertag \
             so I can set it as your nickname (max 32 characters).",
        )
        .await?;

    let reply = match platform.await_gamertag(WAIT_WINDOW).await {
        Ok(reply) => reply,
        Err(Error::Timeout) => return Ok(Outcome::Abandoned),
        Err(e) => return Err(e),
    };

    let gamertag = reply.trim().to_string();
    if gamertag.chars().count() > MAX_GAMERTAG {
        platform
            .send_dm(
                "Your gamertag is too long. Please contact a moderator to set \
                 your nickname manually.",
            )
            .await?;
        return Ok(Outcome::Escalated);
    }

    platform.set_nickname(&gamertag).await?;
    let granted = platform.grant_member_role().await?;

    let confirmation = if granted {
        format!(
            "Your nickname has been set to **{}** and you have been given the Member role!",
            gamertag
        )
    } else {
        format!("Your nickname has been set to **{}**!", gamertag)
    };
    platform.send_dm(&confirmation).await?;

    Ok(Outcome::Completed { gamertag })
}

/// Event glue: gate on the onboarding store, run the flow, persist on
/// completion.
pub async fn on_member_join(
    ctx: &serenity::Context,
    member: &serenity::Member,
    settings: Arc<Mutex<Settings>>,
    onboarding: Arc<Mutex<RecordStore<OnboardingRecord>>>,
) -> Result<(), Error> {
    let key = member.user.id.to_string();

    {
        let store = onboarding.lock().await;
        if !needs_onboarding(&store, &key) {
            log::debug!(
                "'{}' rejoined with completed onboarding, skipping",
                member.user.tag()
            );
            return Ok(());
        }
    }

    let (rules_path, member_role) = {
        let settings = settings.lock().await;
        (settings.rules_file(), settings.member_role.clone())
    };
    let rules = utils::load_text(&rules_path).await?;

    let mut platform = DiscordPlatform::new(ctx, member, member_role);
    match run(&mut platform, &member.user.name, &rules).await {
        Outcome::Completed { gamertag } => {
            let mut store = onboarding.lock().await;
            store.insert(
                key,
                OnboardingRecord {
                    completed: true,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                },
            );
            store.save().await?;
            log::info!(
                "Onboarding completed: '{}' is now '{}'",
                member.user.tag(),
                gamertag
            );
        }
        Outcome::Abandoned => {
            log::info!("Onboarding abandoned by '{}'", member.user.tag());
        }
        Outcome::Escalated => {
            log::info!(
                "Onboarding for '{}' needs a moderator (gamertag too long)",
                member.user.tag()
            );
        }
    }

    Ok(())
}

/// [`Platform`] backed by the live Discord connection for one member.
pub struct DiscordPlatform<'a> {
    ctx: &'a serenity::Context,
    member: &'a serenity::Member,
    member_role: String,
    dm: Option<serenity::PrivateChannel>,
    rules_message: Option<serenity::Message>,
}

impl<'a> DiscordPlatform<'a> {
    pub fn new(
        ctx: &'a serenity::Context,
        member: &'a serenity::Member,
        member_role: String,
    ) -> Self {
        Self {
            ctx,
            member,
            member_role,
            dm: None,
            rules_message: None,
        }
    }

    async fn dm_channel(&mut self) -> Result<serenity::ChannelId, Error> {
        match &self.dm {
            Some(channel) => Ok(channel.id),
            None => {
                let channel = self.member.user.create_dm_channel(self.ctx).await?;
                let id = channel.id;
                self.dm = Some(channel);
                Ok(id)
            }
        }
    }
}

#[serenity::async_trait]
impl Platform for DiscordPlatform<'_> {
    async fn send_rules(&mut self, text: &str) -> Result<(), Error> {
        let channel = self.dm_channel().await?;
        let message = channel.say(&self.ctx.http, text).await?;
        message
            .react(
                self.ctx,
                serenity::ReactionType::Unicode(ACCEPT_MARKER.to_string()),
            )
            .await?;
        self.rules_message = Some(message);
        Ok(())
    }

    async fn send_dm(&mut self, text: &str) -> Result<(), Error> {
        let channel = self.dm_channel().await?;
        channel.say(&self.ctx.http, text).await?;
        Ok(())
    }

    async fn await_rule_accept(&mut self, window: Duration) -> Result<(), Error> {
        let message = self
            .rules_message
            .as_ref()
            .ok_or_else(|| Error::Validation("rules were never delivered".to_string()))?;

        let reaction = message
            .await_reaction(self.ctx)
            .author_id(self.member.user.id)
            .filter(|reaction| reaction.emoji.unicode_eq(ACCEPT_MARKER))
            .timeout(window)
            .await;

        match reaction {
            Some(_) => Ok(()),
            None => Err(Error::Timeout),
        }
    }

    async fn await_gamertag(&mut self, window: Duration) -> Result<String, Error> {
        let channel = self.dm_channel().await?;

        let reply = channel
            .await_reply(self.ctx)
            .author_id(self.member.user.id)
            .timeout(window)
            .await;

        match reply {
            Some(message) => Ok(message.content),
            None => Err(Error::Timeout),
        }
    }

    async fn set_nickname(&mut self, nick: &str) -> Result<(), Error> {
        self.member
            .guild_id
            .edit_member(
                &self.ctx.http,
                self.member.user.id,
                serenity::EditMember::new().nickname(nick),
            )
            .await?;
        Ok(())
    }

    async fn grant_member_role(&mut self) -> Result<bool, Error> {
        let guild = self.member.guild_id.to_partial_guild(self.ctx).await?;
        match guild.role_by_name(&self.member_role) {
            Some(role) => {
                self.member.add_role(&self.ctx.http, role.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockPlatform {
        accept: bool,
        reply: Option<String>,
        fail_sends: bool,
        sent: Vec<String>,
        nickname: Option<String>,
        has_member_role: bool,
        role_granted: bool,
    }

    #[serenity::async_trait]
    impl Platform for MockPlatform {
        async fn send_rules(&mut self, text: &str) -> Result<(), Error> {
            self.send_dm(text).await
        }

        async fn send_dm(&mut self, text: &str) -> Result<(), Error> {
            if self.fail_sends {
                return Err(Error::Validation("dm closed".to_string()));
            }
            self.sent.push(text.to_string());
            Ok(())
        }

        async fn await_rule_accept(&mut self, _window: Duration) -> Result<(), Error> {
            if self.accept {
                Ok(())
            } else {
                Err(Error::Timeout)
            }
        }

        async fn await_gamertag(&mut self, _window: Duration) -> Result<String, Error> {
            self.reply.clone().ok_or(Error::Timeout)
        }

        async fn set_nickname(&mut self, nick: &str) -> Result<(), Error> {
            self.nickname = Some(nick.to_string());
            Ok(())
        }

        async fn grant_member_role(&mut self) -> Result<bool, Error> {
            self.role_granted = self.has_member_role;
            Ok(self.has_member_role)
        }
    }

    #[tokio::test]
    async fn full_flow_completes() {
        let mut platform = MockPlatform {
            accept: true,
            reply: Some("PlayerOne".to_string()),
            has_member_role: true,
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "1. Be nice.").await;

        assert_eq!(
            outcome,
            Outcome::Completed {
                gamertag: "PlayerOne".to_string()
            }
        );
        assert_eq!(platform.nickname.as_deref(), Some("PlayerOne"));
        assert!(platform.role_granted);
        assert!(platform.sent[0].contains("1. Be nice."));
    }

    #[tokio::test]
    async fn reply_is_trimmed() {
        let mut platform = MockPlatform {
            accept: true,
            reply: Some("  PlayerOne \n".to_string()),
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert_eq!(
            outcome,
            Outcome::Completed {
                gamertag: "PlayerOne".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_member_role_still_completes() {
        let mut platform = MockPlatform {
            accept: true,
            reply: Some("PlayerOne".to_string()),
            has_member_role: false,
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert!(matches!(outcome, Outcome::Completed { .. }));
        assert!(!platform.role_granted);
    }

    #[tokio::test]
    async fn no_reaction_abandons() {
        let mut platform = MockPlatform {
            accept: false,
            reply: Some("PlayerOne".to_string()),
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert_eq!(outcome, Outcome::Abandoned);
        assert!(platform.nickname.is_none());
    }

    #[tokio::test]
    async fn no_reply_abandons() {
        let mut platform = MockPlatform {
            accept: true,
            reply: None,
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert_eq!(outcome, Outcome::Abandoned);
        assert!(platform.nickname.is_none());
    }

    #[tokio::test]
    async fn oversize_gamertag_escalates() {
        let mut platform = MockPlatform {
            accept: true,
            reply: Some("a".repeat(MAX_GAMERTAG + 1)),
            has_member_role: true,
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert_eq!(outcome, Outcome::Escalated);
        assert!(platform.nickname.is_none());
        assert!(!platform.role_granted);
        assert!(platform
            .sent
            .last()
            .is_some_and(|text| text.contains("contact a moderator")));
    }

    #[tokio::test]
    async fn max_length_gamertag_is_accepted() {
        let gamertag = "a".repeat(MAX_GAMERTAG);
        let mut platform = MockPlatform {
            accept: true,
            reply: Some(gamertag.clone()),
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert_eq!(
            outcome,
            Outcome::Completed {
                gamertag: gamertag.clone()
            }
        );
        assert_eq!(platform.nickname, Some(gamertag));
    }

    #[tokio::test]
    async fn platform_failure_abandons() {
        let mut platform = MockPlatform {
            fail_sends: true,
            accept: true,
            reply: Some("PlayerOne".to_string()),
            ..Default::default()
        };

        let outcome = run(&mut platform, "NewUser", "rules").await;

        assert_eq!(outcome, Outcome::Abandoned);
        assert!(platform.nickname.is_none());
    }

    static UNIQUE: AtomicUsize = AtomicUsize::new(0);

    fn temp_store() -> RecordStore<OnboardingRecord> {
        let path: PathBuf = std::env::temp_dir().join(format!(
            "legion-bot-onboarding-{}-{}.json",
            std::process::id(),
            UNIQUE.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_file(&path);
        RecordStore::load(path).unwrap()
    }

    #[test]
    fn completed_record_blocks_reentry() {
        let mut store = temp_store();

        assert!(needs_onboarding(&store, "100"));

        store.insert(
            "100",
            OnboardingRecord {
                completed: true,
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            },
        );
        assert!(!needs_onboarding(&store, "100"));

        store.insert(
            "200",
            OnboardingRecord {
                completed: false,
                timestamp: String::new(),
            },
        );
        assert!(needs_onboarding(&store, "200"));
    }
}
