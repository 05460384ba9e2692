pub mod surreal;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::base::types::{Res, Void};

// Traits.

/// Generic store trait that backends must implement.
///
/// This trait defines the core functionality for recording warnings and
/// moderation-log entries. Implementing this trait allows different storage
/// backends to be used with the warden-bot.
#[async_trait]
pub trait GenericStore: Send + Sync + 'static {
    /// Records a warning against a user.
    ///
    /// Returns the user's total warning count including the new one.
    async fn record_warning(&self, user_id: u64, warning: &Warning) -> Res<usize>;

    /// Lists a user's warnings, oldest first.
    async fn warnings_for(&self, user_id: u64) -> Res<Vec<Warning>>;

    /// Appends an entry to the moderation log.
    ///
    /// The log is append-only; entries are never updated or removed.
    async fn append_log(&self, entry: &LogEntry) -> Void;

    /// Reads the most recent log entries, oldest first.
    async fn recent_logs(&self, limit: usize) -> Res<Vec<LogEntry>>;

    /// Reads the most recent log entries for one user, oldest first.
    async fn logs_for(&self, user_id: u64, limit: usize) -> Res<Vec<LogEntry>>;

    /// Counts all log entries.
    async fn log_count(&self) -> Res<usize>;
}

/// Store client for warden-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct StoreClient {
    /// The store backend instance.
    pub inner: Arc<dyn GenericStore>,
}

impl Deref for StoreClient {
    type Target = dyn GenericStore;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl StoreClient {
    pub fn new(inner: Arc<dyn GenericStore>) -> Self {
        Self { inner }
    }
}

// Data types.

/// The kind of a moderation action, as recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MemberJoin,
    Warn,
    Mute,
    Unmute,
    Kick,
    Ban,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::MemberJoin => "member_join",
            ActionKind::Warn => "warn",
            ActionKind::Mute => "mute",
            ActionKind::Unmute => "unmute",
            ActionKind::Kick => "kick",
            ActionKind::Ban => "ban",
        }
    }
}

/// A warning issued against a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub moderator_id: u64,
}

/// One entry in the moderation log.
///
/// `moderator_id`/`moderator_name` are absent for actions the system performs
/// on its own, such as member-join bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: ActionKind,
    pub user_id: u64,
    pub user_name: String,
    pub moderator_id: Option<u64>,
    pub moderator_name: Option<String>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ActionKind::MemberJoin).unwrap();

        assert_eq!(json, r#""member_join""#);
        assert_eq!(ActionKind::MemberJoin.as_str(), "member_join");
    }

    #[test]
    fn log_entry_round_trips_without_details() {
        let entry = LogEntry {
            timestamp: Utc::now(),
            action: ActionKind::Ban,
            user_id: 42,
            user_name: "troublemaker".to_string(),
            moderator_id: Some(7),
            moderator_name: Some("mod".to_string()),
            reason: "spam".to_string(),
            details: None,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("details"));

        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
