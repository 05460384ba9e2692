//! Chat service integration for warden-bot.
//!
//! This module provides functionality for interacting with Discord:
//! - Receiving gateway events (messages, member joins, readiness)
//! - Sending messages, embeds, and direct messages
//! - Performing moderation REST calls (roles, kick, ban)
//!
//! It implements the `GenericChatClient` trait for Discord via serenity; the
//! library owns the gateway connection, heartbeats, reconnection, and rate
//! limits.

use crate::{
    base::{
        config::Config,
        types::{PermissionDenied, Reply, ReplyColor, Res, Void},
    },
    interaction,
    service::store::StoreClient,
};
use async_trait::async_trait;
use serenity::all::{
    ActivityData, ChannelId, Client, Colour, Context, CreateEmbed, CreateMessage, EditRole, EventHandler, GatewayIntents, GuildId, Member, Message, Ready, UserId,
};
use serenity::cache::Cache;
use serenity::gateway::ShardManager;
use serenity::http::{Http, HttpError};
use tracing::{info, instrument, warn};

use std::{
    ops::Deref,
    sync::{Arc, OnceLock},
    time::Duration,
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the discord implementation.

impl ChatClient {
    /// Creates a new Discord chat client.
    pub async fn discord(config: &Config, store: StoreClient) -> Res<Self> {
        let client = DiscordChatClient::new(config, store).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<DiscordChatClient> for ChatClient {
    fn from(client: DiscordChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// Gateway event handler wiring serenity callbacks into the interaction layer.
struct DiscordEventHandler {
    store: StoreClient,
    chat: ChatClient,
    config: Config,
}

/// Discord client implementation.
#[derive(Clone)]
struct DiscordChatClient {
    pub config: Config,
    pub bot_user_id: u64,
    pub http: Arc<Http>,
    pub store: StoreClient,
    shard_manager: Arc<OnceLock<Arc<ShardManager>>>,
    cache: Arc<OnceLock<Arc<Cache>>>,
}

impl Deref for DiscordChatClient {
    type Target = Http;

    fn deref(&self) -> &Self::Target {
        &self.http
    }
}

impl DiscordChatClient {
    /// Create a new Discord chat client.
    #[instrument(name = "DiscordChatClient::new", skip_all)]
    pub async fn new(config: &Config, store: StoreClient) -> Res<Self> {
        // Initialize the REST client and resolve the bot's own identity.

        let http = Arc::new(Http::new(&config.discord_token));

        let bot_user = http.get_current_user().await.map_err(classify_error)?;
        let bot_user_id = bot_user.id.get();

        info!("Discord bot user ID: {}", bot_user_id);

        Ok(Self {
            config: config.clone(),
            bot_user_id,
            http,
            store,
            shard_manager: Arc::new(OnceLock::new()),
            cache: Arc::new(OnceLock::new()),
        })
    }
}

#[async_trait]
impl GenericChatClient for DiscordChatClient {
    fn bot_user_id(&self) -> u64 {
        self.bot_user_id
    }

    async fn start(&self) -> Void {
        // The member-join event requires the privileged GUILD_MEMBERS intent;
        // prefix commands require MESSAGE_CONTENT.

        let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT | GatewayIntents::GUILD_MEMBERS;

        let handler = DiscordEventHandler {
            store: self.store.clone(),
            chat: ChatClient::from(self.clone()),
            config: self.config.clone(),
        };

        let mut client = Client::builder(&self.config.discord_token, intents).event_handler(handler).await?;

        // Shard and cache handles only exist once the client is built; the
        // ping and status commands read them through these cells.
        let _ = self.shard_manager.set(client.shard_manager.clone());
        let _ = self.cache.set(client.cache.clone());

        // Connect to the gateway and process events until shutdown.
        client.start().await?;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: u64, text: &str) -> Void {
        let message = CreateMessage::new().content(text);

        let _ = ChannelId::new(channel_id).send_message(&self.http, message).await.map_err(classify_error)?;

        Ok(())
    }

    #[instrument(skip(self, reply))]
    async fn send_reply(&self, channel_id: u64, reply: &Reply) -> Void {
        let mut embed = CreateEmbed::new().title(reply.title.clone()).description(reply.description.clone()).colour(colour_for(reply.color));

        for field in &reply.fields {
            embed = embed.field(field.name.clone(), field.value.clone(), field.inline);
        }

        let message = CreateMessage::new().embed(embed);

        let _ = ChannelId::new(channel_id).send_message(&self.http, message).await.map_err(classify_error)?;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_direct_message(&self, user_id: u64, text: &str) -> Void {
        let channel = UserId::new(user_id).create_dm_channel(&self.http).await.map_err(classify_error)?;

        let _ = channel.id.send_message(&self.http, CreateMessage::new().content(text)).await.map_err(classify_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn lookup_user(&self, user_id: u64) -> Res<String> {
        let user = self.http.get_user(UserId::new(user_id)).await.map_err(classify_error)?;

        Ok(user.name)
    }

    #[instrument(skip(self, reason))]
    async fn assign_role(&self, guild_id: u64, user_id: u64, role_name: &str, reason: &str) -> Void {
        let guild = GuildId::new(guild_id);
        let roles = guild.roles(&self.http).await.map_err(classify_error)?;

        let role_id = match roles.values().find(|role| role.name == role_name) {
            Some(role) => role.id,
            None => {
                info!("Guild `{}` has no `{}` role, creating it.", guild_id, role_name);

                let role = guild
                    .create_role(&self.http, EditRole::new().name(role_name).audit_log_reason(reason))
                    .await
                    .map_err(classify_error)?;

                role.id
            }
        };

        self.add_member_role(guild, UserId::new(user_id), role_id, Some(reason)).await.map_err(classify_error)?;

        Ok(())
    }

    #[instrument(skip(self, reason))]
    async fn remove_role(&self, guild_id: u64, user_id: u64, role_name: &str, reason: &str) -> Res<bool> {
        let guild = GuildId::new(guild_id);
        let roles = guild.roles(&self.http).await.map_err(classify_error)?;

        let Some(role) = roles.values().find(|role| role.name == role_name) else {
            return Ok(false);
        };

        let member = guild.member(&self.http, UserId::new(user_id)).await.map_err(classify_error)?;

        if !member.roles.contains(&role.id) {
            return Ok(false);
        }

        self.remove_member_role(guild, UserId::new(user_id), role.id, Some(reason)).await.map_err(classify_error)?;

        Ok(true)
    }

    #[instrument(skip(self, reason))]
    async fn kick(&self, guild_id: u64, user_id: u64, reason: &str) -> Void {
        self.kick_member(GuildId::new(guild_id), UserId::new(user_id), Some(reason)).await.map_err(classify_error)?;

        Ok(())
    }

    #[instrument(skip(self, reason))]
    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> Void {
        self.ban_user(GuildId::new(guild_id), UserId::new(user_id), 0, Some(reason)).await.map_err(classify_error)?;

        Ok(())
    }

    async fn gateway_latency(&self) -> Option<Duration> {
        let manager = self.shard_manager.get()?;
        let runners = manager.runners.lock().await;

        runners.values().find_map(|runner| runner.latency)
    }

    async fn guild_count(&self) -> Res<usize> {
        let cache = self.cache.get().ok_or_else(|| anyhow::anyhow!("Gateway cache is not available yet."))?;

        Ok(cache.guilds().len())
    }
}

// Gateway event callbacks for Discord.

#[async_trait]
impl EventHandler for DiscordEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Bot logged in as {}", ready.user.name);

        ctx.set_activity(Some(ActivityData::playing(self.config.presence.clone())));
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        info!("Member joined: {}", new_member.user.name);

        interaction::member_join::handle_member_join(new_member.user.id.get(), new_member.user.name.clone(), self.store.clone());
    }

    async fn message(&self, _ctx: Context, message: Message) {
        // Never react to bots, including ourselves.
        if message.author.bot || message.author.id.get() == self.chat.bot_user_id() {
            return;
        }

        let request = interaction::command::CommandRequest {
            guild_id: message.guild_id.map(|id| id.get()),
            channel_id: message.channel_id.get(),
            author_id: message.author.id.get(),
            author_name: message.author.name.clone(),
            content: message.content.clone(),
        };

        // Guild chatter without the prefix is none of our business.
        if message.content.starts_with(&self.config.command_prefix) {
            interaction::command::handle_command(request, self.store.clone(), self.chat.clone(), self.config.clone());
        } else if message.guild_id.is_none() {
            interaction::direct_message::handle_direct_message(request, self.chat.clone(), self.config.clone());
        }
    }
}

// Helpers.

/// Map a permission rejection (HTTP 403) to `PermissionDenied` so dispatch can
/// report the platform's message verbatim; everything else passes through.
fn classify_error(err: serenity::Error) -> crate::base::types::Err {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)) = err
        && response.status_code.as_u16() == 403
    {
        warn!("Permission rejection from Discord: {}", response.error.message);
        return PermissionDenied(response.error.message.clone()).into();
    }

    err.into()
}

/// Resolve a platform-neutral reply color to a Discord embed colour.
fn colour_for(color: ReplyColor) -> Colour {
    match color {
        ReplyColor::Info => Colour::BLUE,
        ReplyColor::Success => Colour::DARK_GREEN,
        ReplyColor::Warning => Colour::ORANGE,
        ReplyColor::Danger => Colour::RED,
        ReplyColor::Critical => Colour::DARK_RED,
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_match_action_severity() {
        assert_eq!(colour_for(ReplyColor::Warning), Colour::ORANGE);
        assert_eq!(colour_for(ReplyColor::Critical), Colour::DARK_RED);
        assert_ne!(colour_for(ReplyColor::Danger), colour_for(ReplyColor::Critical));
    }
}
