//! Moderator command parsing and dispatch.
//!
//! Every moderation command is a direct call into the chat platform's REST
//! surface plus a log append; there are no retries and no partial-failure
//! recovery. A permission rejection from the platform is reported verbatim to
//! the invoking channel; any other failure propagates to the spawn wrapper.

use chrono::Utc;
use serde_json::json;
use tracing::{Instrument, debug, error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Err, PermissionDenied, Reply, ReplyColor, Res, Void},
    },
    service::{
        chat::ChatClient,
        store::{ActionKind, LogEntry, StoreClient, Warning},
    },
};

/// Reason recorded when the moderator does not give one.
const DEFAULT_REASON: &str = "No reason";

/// How many entries a `logs` reply renders at most.
const LOGS_REPLY_LIMIT: usize = 5;

/// Platform-neutral view of an incoming message that may carry a command.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Guild the message was sent in; `None` for direct messages.
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
}

/// A parsed moderator command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Warn { target: u64, reason: String },
    Mute { target: u64, reason: String },
    Unmute { target: u64, reason: String },
    Kick { target: u64, reason: String },
    Ban { target: u64, reason: String },
    Logs { target: Option<u64> },
    Ping,
    Status,
    Help,
}

/// Outcome of trying to read a message as a command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parsed {
    Command(Command),
    /// A known command with missing or malformed arguments.
    Usage(&'static str),
    NotACommand,
}

/// Handles a message that starts with the command prefix.
///
/// This spawns a new task to process the command asynchronously; failures are
/// logged rather than surfaced to the gateway dispatcher.
#[instrument(skip_all)]
pub fn handle_command(request: CommandRequest, store: StoreClient, chat: ChatClient, config: Config) {
    tokio::spawn(async move {
        // Process the command.
        let result = handle_command_internal(request, &store, &chat, &config).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

#[instrument(skip_all)]
async fn handle_command_internal(request: CommandRequest, store: &StoreClient, chat: &ChatClient, config: &Config) -> Void {
    let command = match parse(&request.content, &config.command_prefix) {
        Parsed::Command(command) => command,
        Parsed::Usage(usage) => {
            chat.send_message(request.channel_id, &format!("Usage: {}{}", config.command_prefix, usage)).await?;
            return Ok(());
        }
        Parsed::NotACommand => {
            debug!("Ignoring message without a known command.");
            return Ok(());
        }
    };

    match command {
        Command::Warn { target, reason } => warn_member(&request, target, reason, store, chat).await,
        Command::Mute { target, reason } => mute_member(&request, target, reason, store, chat, config).await,
        Command::Unmute { target, reason } => unmute_member(&request, target, reason, store, chat, config).await,
        Command::Kick { target, reason } => kick_member(&request, target, reason, store, chat).await,
        Command::Ban { target, reason } => ban_member(&request, target, reason, store, chat).await,
        Command::Logs { target } => show_logs(&request, target, store, chat, config).await,
        Command::Ping => ping(&request, chat).await,
        Command::Status => status(&request, store, chat).await,
        Command::Help => help(&request, chat, config).await,
    }
}

// Parsing.

fn parse(content: &str, prefix: &str) -> Parsed {
    let Some(rest) = content.strip_prefix(prefix) else {
        return Parsed::NotACommand;
    };

    let mut words = rest.split_whitespace();
    let Some(name) = words.next() else {
        return Parsed::NotACommand;
    };

    match name {
        "warn" => parse_targeted(words, "warn <user> [reason]", |target, reason| Command::Warn { target, reason }),
        "mute" => parse_targeted(words, "mute <user> [reason]", |target, reason| Command::Mute { target, reason }),
        "unmute" => parse_targeted(words, "unmute <user> [reason]", |target, reason| Command::Unmute { target, reason }),
        "kick" => parse_targeted(words, "kick <user> [reason]", |target, reason| Command::Kick { target, reason }),
        "ban" => parse_targeted(words, "ban <user> [reason]", |target, reason| Command::Ban { target, reason }),
        "logs" => match words.next() {
            None => Parsed::Command(Command::Logs { target: None }),
            Some(token) => match parse_user_ref(token) {
                Some(target) => Parsed::Command(Command::Logs { target: Some(target) }),
                None => Parsed::Usage("logs [user]"),
            },
        },
        "ping" => Parsed::Command(Command::Ping),
        "status" => Parsed::Command(Command::Status),
        "help" => Parsed::Command(Command::Help),
        _ => Parsed::NotACommand,
    }
}

fn parse_targeted<F>(mut words: std::str::SplitWhitespace<'_>, usage: &'static str, build: F) -> Parsed
where
    F: FnOnce(u64, String) -> Command,
{
    let Some(token) = words.next() else {
        return Parsed::Usage(usage);
    };

    let Some(target) = parse_user_ref(token) else {
        return Parsed::Usage(usage);
    };

    let rest: Vec<&str> = words.collect();
    let reason = if rest.is_empty() { DEFAULT_REASON.to_string() } else { rest.join(" ") };

    Parsed::Command(build(target, reason))
}

/// Parse a user reference: a `<@id>` or `<@!id>` mention, or a bare id.
fn parse_user_ref(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("<@")
        .map(|rest| rest.strip_prefix('!').unwrap_or(rest))
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(token);

    digits.parse().ok().filter(|id| *id != 0)
}

// Command handlers.

async fn warn_member(request: &CommandRequest, target: u64, reason: String, store: &StoreClient, chat: &ChatClient) -> Void {
    let Some(_guild_id) = require_guild(request, chat).await? else {
        return Ok(());
    };

    if target == request.author_id {
        chat.send_message(request.channel_id, "You can't warn yourself!").await?;
        return Ok(());
    }

    let target_name = chat.lookup_user(target).await?;

    let warning = Warning {
        reason: reason.clone(),
        timestamp: Utc::now(),
        moderator_id: request.author_id,
    };
    let count = store.record_warning(target, &warning).await?;

    record_action(request, store, ActionKind::Warn, target, &target_name, &reason, Some(json!({ "count": count }))).await?;

    let reply = Reply::new("User Warned", format!("<@{target}> warned"), ReplyColor::Warning)
        .field("Reason", reason)
        .field("Total Warnings", count.to_string());

    chat.send_reply(request.channel_id, &reply).await
}

async fn mute_member(request: &CommandRequest, target: u64, reason: String, store: &StoreClient, chat: &ChatClient, config: &Config) -> Void {
    let Some(guild_id) = require_guild(request, chat).await? else {
        return Ok(());
    };

    let target_name = chat.lookup_user(target).await?;

    if let Err(err) = chat.assign_role(guild_id, target, &config.muted_role, &reason).await {
        return report_permission_denied(err, request, chat).await;
    }

    record_action(request, store, ActionKind::Mute, target, &target_name, &reason, None).await?;

    let reply = Reply::new("User Muted", format!("<@{target}> muted"), ReplyColor::Danger).field("Reason", reason);

    chat.send_reply(request.channel_id, &reply).await
}

async fn unmute_member(request: &CommandRequest, target: u64, reason: String, store: &StoreClient, chat: &ChatClient, config: &Config) -> Void {
    let Some(guild_id) = require_guild(request, chat).await? else {
        return Ok(());
    };

    let target_name = chat.lookup_user(target).await?;

    let removed = match chat.remove_role(guild_id, target, &config.muted_role, &reason).await {
        Ok(removed) => removed,
        Err(err) => return report_permission_denied(err, request, chat).await,
    };

    if !removed {
        debug!("Member `{}` did not carry the `{}` role.", target, config.muted_role);
    }

    record_action(request, store, ActionKind::Unmute, target, &target_name, &reason, None).await?;

    let reply = Reply::new("User Unmuted", format!("<@{target}> unmuted"), ReplyColor::Success);

    chat.send_reply(request.channel_id, &reply).await
}

async fn kick_member(request: &CommandRequest, target: u64, reason: String, store: &StoreClient, chat: &ChatClient) -> Void {
    let Some(guild_id) = require_guild(request, chat).await? else {
        return Ok(());
    };

    let target_name = chat.lookup_user(target).await?;

    if let Err(err) = chat.kick(guild_id, target, &reason).await {
        return report_permission_denied(err, request, chat).await;
    }

    record_action(request, store, ActionKind::Kick, target, &target_name, &reason, None).await?;

    let reply = Reply::new("User Kicked", format!("{target_name} kicked"), ReplyColor::Danger).field("Reason", reason);

    chat.send_reply(request.channel_id, &reply).await
}

async fn ban_member(request: &CommandRequest, target: u64, reason: String, store: &StoreClient, chat: &ChatClient) -> Void {
    let Some(guild_id) = require_guild(request, chat).await? else {
        return Ok(());
    };

    let target_name = chat.lookup_user(target).await?;

    if let Err(err) = chat.ban(guild_id, target, &reason).await {
        return report_permission_denied(err, request, chat).await;
    }

    record_action(request, store, ActionKind::Ban, target, &target_name, &reason, None).await?;

    let reply = Reply::new("User Banned", format!("{target_name} banned"), ReplyColor::Critical).field("Reason", reason);

    chat.send_reply(request.channel_id, &reply).await
}

async fn show_logs(request: &CommandRequest, target: Option<u64>, store: &StoreClient, chat: &ChatClient, config: &Config) -> Void {
    let entries = match target {
        Some(user_id) => store.logs_for(user_id, config.recent_log_limit).await?,
        None => store.recent_logs(config.recent_log_limit).await?,
    };

    chat.send_reply(request.channel_id, &build_logs_reply(&entries)).await
}

async fn ping(request: &CommandRequest, chat: &ChatClient) -> Void {
    let latency = match chat.gateway_latency().await {
        Some(latency) => format!("{}ms", latency.as_millis()),
        None => "unknown".to_string(),
    };

    info!("Ping: {}", latency);

    let reply = Reply::new("Pong!", format!("Latency: {latency}"), ReplyColor::Success);

    chat.send_reply(request.channel_id, &reply).await
}

async fn status(request: &CommandRequest, store: &StoreClient, chat: &ChatClient) -> Void {
    let guilds = chat.guild_count().await?;
    let logged = store.log_count().await?;

    let reply = Reply::new("Bot Status", "Online and operational", ReplyColor::Success)
        .field("Guilds", guilds.to_string())
        .field("Logged Actions", logged.to_string());

    chat.send_reply(request.channel_id, &reply).await
}

async fn help(request: &CommandRequest, chat: &ChatClient, config: &Config) -> Void {
    chat.send_reply(request.channel_id, &build_help_reply(&config.command_prefix)).await
}

// Helpers.

/// Resolve the guild a moderation command applies to, or tell the invoker
/// that the command does not work in direct messages.
async fn require_guild(request: &CommandRequest, chat: &ChatClient) -> Res<Option<u64>> {
    match request.guild_id {
        Some(guild_id) => Ok(Some(guild_id)),
        None => {
            chat.send_message(request.channel_id, "This command can only be used in a server.").await?;
            Ok(None)
        }
    }
}

/// Render a permission rejection verbatim to the invoking channel; anything
/// else propagates to the spawn wrapper's error logging.
async fn report_permission_denied(err: Err, request: &CommandRequest, chat: &ChatClient) -> Void {
    match err.downcast_ref::<PermissionDenied>() {
        Some(denied) => {
            let reply = Reply::new("Permission denied", denied.to_string(), ReplyColor::Danger);
            chat.send_reply(request.channel_id, &reply).await
        }
        None => Err(err),
    }
}

/// Append a moderation-log entry attributed to the invoking moderator.
async fn record_action(
    request: &CommandRequest,
    store: &StoreClient,
    action: ActionKind,
    target: u64,
    target_name: &str,
    reason: &str,
    details: Option<serde_json::Value>,
) -> Void {
    info!("MOD: {} on {} - {}", action.as_str(), target_name, reason);

    store
        .append_log(&LogEntry {
            timestamp: Utc::now(),
            action,
            user_id: target,
            user_name: target_name.to_string(),
            moderator_id: Some(request.author_id),
            moderator_name: Some(request.author_name.clone()),
            reason: reason.to_string(),
            details,
        })
        .await
}

fn build_logs_reply(entries: &[LogEntry]) -> Reply {
    let mut reply = Reply::new("Moderation Logs", format!("{} entries", entries.len()), ReplyColor::Info);

    let start = entries.len().saturating_sub(LOGS_REPLY_LIMIT);
    for entry in &entries[start..] {
        reply = reply.block_field(entry.action.as_str().to_uppercase(), format!("User: {}\nReason: {}", entry.user_name, entry.reason));
    }

    reply
}

fn build_help_reply(prefix: &str) -> Reply {
    let description = format!(
        "{prefix}warn <user> [reason] - warn a member\n\
         {prefix}mute <user> [reason] - assign the muted role\n\
         {prefix}unmute <user> [reason] - remove the muted role\n\
         {prefix}kick <user> [reason] - kick a member\n\
         {prefix}ban <user> [reason] - ban a member\n\
         {prefix}logs [user] - show recent moderation logs\n\
         {prefix}ping - gateway latency\n\
         {prefix}status - bot status"
    );

    Reply::new("Commands", description, ReplyColor::Info)
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn user_refs_accept_mentions_and_bare_ids() {
        assert_eq!(parse_user_ref("<@42>"), Some(42));
        assert_eq!(parse_user_ref("<@!42>"), Some(42));
        assert_eq!(parse_user_ref("42"), Some(42));
        assert_eq!(parse_user_ref("<@abc>"), None);
        assert_eq!(parse_user_ref("everyone"), None);
        assert_eq!(parse_user_ref("0"), None);
    }

    #[test]
    fn warn_parses_target_and_reason() {
        let parsed = parse("!warn <@42> being rude in general", "!");

        assert_eq!(
            parsed,
            Parsed::Command(Command::Warn {
                target: 42,
                reason: "being rude in general".to_string(),
            })
        );
    }

    #[test]
    fn missing_reason_falls_back_to_default() {
        let parsed = parse("!ban <@42>", "!");

        assert_eq!(
            parsed,
            Parsed::Command(Command::Ban {
                target: 42,
                reason: DEFAULT_REASON.to_string(),
            })
        );
    }

    #[test]
    fn missing_target_yields_usage() {
        assert_eq!(parse("!mute", "!"), Parsed::Usage("mute <user> [reason]"));
        assert_eq!(parse("!kick not-a-user", "!"), Parsed::Usage("kick <user> [reason]"));
    }

    #[test]
    fn logs_target_is_optional() {
        assert_eq!(parse("!logs", "!"), Parsed::Command(Command::Logs { target: None }));
        assert_eq!(parse("!logs <@42>", "!"), Parsed::Command(Command::Logs { target: Some(42) }));
        assert_eq!(parse("!logs gibberish", "!"), Parsed::Usage("logs [user]"));
    }

    #[test]
    fn unknown_and_unprefixed_messages_are_ignored() {
        assert_eq!(parse("!frobnicate", "!"), Parsed::NotACommand);
        assert_eq!(parse("hello there", "!"), Parsed::NotACommand);
        assert_eq!(parse("!", "!"), Parsed::NotACommand);
    }

    #[test]
    fn prefix_is_configurable() {
        assert_eq!(parse("!ping", "?"), Parsed::NotACommand);
        assert_eq!(parse("?ping", "?"), Parsed::Command(Command::Ping));
    }

    #[test]
    fn logs_reply_renders_the_last_five_entries() {
        let entries: Vec<LogEntry> = (0..7)
            .map(|i| LogEntry {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, i).unwrap(),
                action: ActionKind::Warn,
                user_id: 42,
                user_name: format!("user-{i}"),
                moderator_id: Some(7),
                moderator_name: Some("mod".to_string()),
                reason: format!("reason-{i}"),
                details: None,
            })
            .collect();

        let reply = build_logs_reply(&entries);

        assert_eq!(reply.description, "7 entries");
        assert_eq!(reply.fields.len(), 5);
        assert_eq!(reply.fields[0].name, "WARN");
        assert!(reply.fields[4].value.contains("reason-6"));
    }

    #[test]
    fn help_reply_uses_the_configured_prefix() {
        let reply = build_help_reply("?");

        assert!(reply.description.contains("?warn <user> [reason]"));
        assert!(!reply.description.contains("!warn"));
    }
}
