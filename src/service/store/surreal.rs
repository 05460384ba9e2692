//! SurrealDB implementation for warden-bot data storage.
//!
//! Warnings and moderation-log entries live in SurrealDB (the embedded
//! memory engine by default, a remote endpoint if configured). Every log
//! entry is additionally mirrored as one JSON line to an append-only journal
//! file, which is never read back.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
    sql::{Datetime, Thing},
};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{ActionKind, GenericStore, LogEntry, StoreClient, Warning};

// Extra constructors on `StoreClient` applied by the surreal implementation.

impl StoreClient {
    /// Creates a store client backed by the configured SurrealDB endpoint.
    pub async fn surreal(config: &Config) -> Res<Self> {
        Ok(Self::new(Arc::new(SurrealStore::new(config).await?)))
    }

    /// Creates a store client backed by the embedded memory engine, with no
    /// journal file. Used by tests.
    pub async fn surreal_memory() -> Res<Self> {
        Ok(Self::new(Arc::new(SurrealStore::memory(None).await?)))
    }
}

// Structs.

/// SurrealDB store implementation.
pub struct SurrealStore {
    /// The SurrealDB client instance.
    db: Surreal<Any>,
    /// Path of the append-only journal file, if mirroring is enabled.
    journal: Option<PathBuf>,
}

/// A warning record in the database.
///
/// User ids are stored as strings; Discord snowflakes do not fit the engine's
/// signed integer type for all time.
#[derive(Debug, Serialize, Deserialize)]
struct WarningRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    user_id: String,
    reason: String,
    timestamp: Datetime,
    moderator_id: String,
}

/// A moderation-log record in the database.
#[derive(Debug, Serialize, Deserialize)]
struct LogRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    timestamp: Datetime,
    action: ActionKind,
    user_id: String,
    user_name: String,
    moderator_id: Option<String>,
    moderator_name: Option<String>,
    reason: String,
    details: Option<Value>,
}

/// Shape of a `count() ... GROUP ALL` result.
#[derive(Debug, Deserialize)]
struct CountRow {
    total: usize,
}

impl WarningRow {
    fn new(user_id: u64, warning: &Warning) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            reason: warning.reason.clone(),
            timestamp: Datetime::from(warning.timestamp),
            moderator_id: warning.moderator_id.to_string(),
        }
    }
}

impl From<WarningRow> for Warning {
    fn from(row: WarningRow) -> Self {
        Self {
            reason: row.reason,
            timestamp: row.timestamp.0,
            moderator_id: row.moderator_id.parse().unwrap_or_default(),
        }
    }
}

impl LogRow {
    fn new(entry: &LogEntry) -> Self {
        Self {
            id: None,
            timestamp: Datetime::from(entry.timestamp),
            action: entry.action,
            user_id: entry.user_id.to_string(),
            user_name: entry.user_name.clone(),
            moderator_id: entry.moderator_id.map(|id| id.to_string()),
            moderator_name: entry.moderator_name.clone(),
            reason: entry.reason.clone(),
            details: entry.details.clone(),
        }
    }
}

impl From<LogRow> for LogEntry {
    fn from(row: LogRow) -> Self {
        Self {
            timestamp: row.timestamp.0,
            action: row.action,
            user_id: row.user_id.parse().unwrap_or_default(),
            user_name: row.user_name,
            moderator_id: row.moderator_id.and_then(|id| id.parse().ok()),
            moderator_name: row.moderator_name,
            reason: row.reason,
            details: row.details,
        }
    }
}

impl SurrealStore {
    /// Create a new store from the configuration.
    ///
    /// `db_endpoint = "memory"` selects the embedded engine; anything else is
    /// treated as a remote endpoint URL and signed into with the configured
    /// root credentials.
    #[instrument(skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        let db = if config.db_endpoint == "memory" {
            connect("mem://").await?
        } else {
            let db = connect(config.db_endpoint.as_str()).await?;

            db.signin(Root {
                username: &config.db_username,
                password: &config.db_password,
            })
            .await?;

            db
        };

        let journal = Some(PathBuf::from(&config.log_journal_path));

        Self::initialize(db, journal).await
    }

    /// Create a store on the embedded memory engine.
    pub async fn memory(journal: Option<PathBuf>) -> Res<Self> {
        let db = connect("mem://").await?;

        Self::initialize(db, journal).await
    }

    async fn initialize(db: Surreal<Any>, journal: Option<PathBuf>) -> Res<Self> {
        // Use a specific namespace and database.
        db.use_ns("warden").use_db("bot").await?;

        // Define schemas. Both tables are keyed by lookup on user_id.
        db.query("DEFINE TABLE warning SCHEMALESS").await?;
        db.query("DEFINE INDEX warning_user ON warning FIELDS user_id").await?;
        db.query("DEFINE TABLE mod_log SCHEMALESS").await?;
        db.query("DEFINE INDEX mod_log_user ON mod_log FIELDS user_id").await?;

        info!("Store initialized successfully.");

        Ok(Self { db, journal })
    }

    /// Mirror a log entry as one JSON line to the journal file.
    async fn mirror_to_journal(&self, entry: &LogEntry) -> Void {
        let Some(path) = &self.journal else {
            return Ok(());
        };

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;

        Ok(())
    }
}

#[async_trait]
impl GenericStore for SurrealStore {
    #[instrument(skip(self, warning))]
    async fn record_warning(&self, user_id: u64, warning: &Warning) -> Res<usize> {
        let _: Option<WarningRow> = self.db.create("warning").content(WarningRow::new(user_id, warning)).await?;

        let mut response = self
            .db
            .query("SELECT count() AS total FROM warning WHERE user_id = $user GROUP ALL")
            .bind(("user", user_id.to_string()))
            .await?;
        let count: Option<CountRow> = response.take(0)?;

        Ok(count.map(|row| row.total).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn warnings_for(&self, user_id: u64) -> Res<Vec<Warning>> {
        let mut response = self
            .db
            .query("SELECT * FROM warning WHERE user_id = $user ORDER BY timestamp ASC")
            .bind(("user", user_id.to_string()))
            .await?;
        let rows: Vec<WarningRow> = response.take(0)?;

        Ok(rows.into_iter().map(Warning::from).collect())
    }

    #[instrument(skip_all)]
    async fn append_log(&self, entry: &LogEntry) -> Void {
        debug!("Appending `{}` log entry for `{}`.", entry.action.as_str(), entry.user_id);

        let _: Option<LogRow> = self.db.create("mod_log").content(LogRow::new(entry)).await?;

        self.mirror_to_journal(entry).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_logs(&self, limit: usize) -> Res<Vec<LogEntry>> {
        let mut response = self.db.query(format!("SELECT * FROM mod_log ORDER BY timestamp DESC LIMIT {limit}")).await?;
        let rows: Vec<LogRow> = response.take(0)?;

        let mut entries: Vec<LogEntry> = rows.into_iter().map(LogEntry::from).collect();
        entries.reverse();

        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn logs_for(&self, user_id: u64, limit: usize) -> Res<Vec<LogEntry>> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM mod_log WHERE user_id = $user ORDER BY timestamp DESC LIMIT {limit}"))
            .bind(("user", user_id.to_string()))
            .await?;
        let rows: Vec<LogRow> = response.take(0)?;

        let mut entries: Vec<LogEntry> = rows.into_iter().map(LogEntry::from).collect();
        entries.reverse();

        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn log_count(&self) -> Res<usize> {
        let mut response = self.db.query("SELECT count() AS total FROM mod_log GROUP ALL").await?;
        let count: Option<CountRow> = response.take(0)?;

        Ok(count.map(|row| row.total).unwrap_or_default())
    }
}

// Tests.
