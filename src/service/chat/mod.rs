pub mod discord;

use std::{ops::Deref, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::base::types::{Reply, Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Discord. Implementing this trait allows different chat services to be used
/// with the warden-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the bot user ID.
    ///
    /// Returns the unique identifier for the bot in the chat platform,
    /// which is used to ignore the bot's own messages.
    fn bot_user_id(&self) -> u64;

    /// Start the chat client listener.
    ///
    /// This connects to the platform's event gateway and begins processing
    /// incoming messages and events.
    async fn start(&self) -> Void;

    /// Send a plain text message to a channel.
    async fn send_message(&self, channel_id: u64, text: &str) -> Void;

    /// Send a rich reply (an embed) to a channel.
    async fn send_reply(&self, channel_id: u64, reply: &Reply) -> Void;

    /// Send a direct message to a user.
    async fn send_direct_message(&self, user_id: u64, text: &str) -> Void;

    /// Look up a user's display name.
    async fn lookup_user(&self, user_id: u64) -> Res<String>;

    /// Assign a named role to a guild member, creating the role if the guild
    /// does not have it yet.
    async fn assign_role(&self, guild_id: u64, user_id: u64, role_name: &str, reason: &str) -> Void;

    /// Remove a named role from a guild member.
    ///
    /// Returns `false` if the guild has no such role or the member does not
    /// carry it; removing an absent role is not an error.
    async fn remove_role(&self, guild_id: u64, user_id: u64, role_name: &str, reason: &str) -> Res<bool>;

    /// Kick a member from a guild.
    async fn kick(&self, guild_id: u64, user_id: u64, reason: &str) -> Void;

    /// Ban a member from a guild.
    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> Void;

    /// Get the current gateway heartbeat latency, if one has been measured.
    async fn gateway_latency(&self) -> Option<Duration>;

    /// Get the number of guilds the bot is currently in.
    async fn guild_count(&self) -> Res<usize>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
