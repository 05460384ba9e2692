//! Event handling and user interactions for warden-bot.
//!
//! This module provides functionality for handling gateway events:
//! - Parsing and dispatching moderator commands
//! - Recording member joins in the moderation log
//! - Answering direct messages with canned guidance

pub mod command;
pub mod direct_message;
pub mod member_join;
