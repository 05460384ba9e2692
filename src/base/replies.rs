//! Canned reply text for the direct-message responder.

/// Reply sent when a DM asks for help.
pub const DM_HELP_REPLY: &str =
    "Use !warn, !mute, !kick, !ban, !unmute, !logs in servers. I help moderate Discord communities!";

/// Reply sent when a DM asks who or what the bot is.
pub const DM_ABOUT_REPLY: &str =
    "I'm a Discord moderation bot with comprehensive logging!";

/// Reply sent when a DM matches nothing else.
pub const DM_FALLBACK_REPLY: &str =
    "Thanks for reaching out! I'm here to help moderate. Ask me about moderation commands!";
