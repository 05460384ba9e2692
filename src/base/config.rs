//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::replies;

use super::types::Res;

/// Default command prefix.
fn default_command_prefix() -> String {
    "!".to_string()
}

/// Default name of the role assigned by `mute`.
fn default_muted_role() -> String {
    "Muted".to_string()
}

/// Default presence text shown while the bot is online.
fn default_presence() -> String {
    "!help".to_string()
}

/// Default path of the append-only moderation journal.
fn default_log_journal_path() -> String {
    "moderation_logs.jsonl".to_string()
}

/// Default number of entries returned by a bare `logs` command.
fn default_recent_log_limit() -> usize {
    10
}

/// Default store endpoint; `memory` selects the embedded engine.
fn default_db_endpoint() -> String {
    "memory".to_string()
}

/// Default DM reply for help requests.
fn default_dm_help_reply() -> String {
    replies::DM_HELP_REPLY.to_string()
}

/// Default DM reply describing the bot.
fn default_dm_about_reply() -> String {
    replies::DM_ABOUT_REPLY.to_string()
}

/// Default DM reply when nothing else matches.
fn default_dm_fallback_reply() -> String {
    replies::DM_FALLBACK_REPLY.to_string()
}

/// Configuration for the warden-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Discord bot token (`DISCORD_TOKEN`).
    pub discord_token: String,
    /// Command prefix for moderator commands (`COMMAND_PREFIX`).
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Name of the role assigned by `mute` and removed by `unmute`
    /// (`MUTED_ROLE`). Created on demand if the guild lacks it.
    #[serde(default = "default_muted_role")]
    pub muted_role: String,
    /// Presence text shown while online (`PRESENCE`).
    #[serde(default = "default_presence")]
    pub presence: String,
    /// Path of the append-only moderation journal (`LOG_JOURNAL_PATH`).
    /// One JSON object per line; never read back.
    #[serde(default = "default_log_journal_path")]
    pub log_journal_path: String,
    /// Number of entries returned by a bare `logs` command
    /// (`RECENT_LOG_LIMIT`). Must be between 1 and 50.
    #[serde(default = "default_recent_log_limit")]
    pub recent_log_limit: usize,
    /// Optional custom DM reply for help requests (`DM_HELP_REPLY`).
    #[serde(default = "default_dm_help_reply")]
    pub dm_help_reply: String,
    /// Optional custom DM reply describing the bot (`DM_ABOUT_REPLY`).
    #[serde(default = "default_dm_about_reply")]
    pub dm_about_reply: String,
    /// Optional custom DM fallback reply (`DM_FALLBACK_REPLY`).
    #[serde(default = "default_dm_fallback_reply")]
    pub dm_fallback_reply: String,
    /// Store endpoint URL (`DB_ENDPOINT`); `memory` selects the embedded
    /// engine.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Store username (`DB_USERNAME`); only used with a remote endpoint.
    #[serde(default)]
    pub db_username: String,
    /// Store password (`DB_PASSWORD`); only used with a remote endpoint.
    #[serde(default)]
    pub db_password: String,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("WARDEN_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new("warden.toml").exists() {
            cfg = cfg.add_source(config::File::with_name("warden"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.command_prefix.is_empty() {
            return Err(anyhow::anyhow!("Command prefix must not be empty."));
        }

        if result.muted_role.is_empty() {
            return Err(anyhow::anyhow!("Muted role name must not be empty."));
        }

        if result.recent_log_limit < 1 || result.recent_log_limit > 50 {
            return Err(anyhow::anyhow!("Recent log limit must be between 1 and 50."));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_everything_but_the_token() {
        let inner: ConfigInner = serde_json::from_str(r#"{"discord_token": "token"}"#).unwrap();

        assert_eq!(inner.command_prefix, "!");
        assert_eq!(inner.muted_role, "Muted");
        assert_eq!(inner.recent_log_limit, 10);
        assert_eq!(inner.db_endpoint, "memory");
        assert_eq!(inner.dm_help_reply, replies::DM_HELP_REPLY);
    }
}
