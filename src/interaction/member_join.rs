//! This module records member joins in the moderation log.

use chrono::Utc;
use tracing::{Instrument, error, instrument};

use crate::{
    base::types::Void,
    service::store::{ActionKind, LogEntry, StoreClient},
};

/// Handles a member-join event.
///
/// The join is recorded as a moderation-log entry with no moderator.
/// It spawns a new task to handle the event asynchronously.
#[instrument(skip_all)]
pub fn handle_member_join(user_id: u64, user_name: String, store: StoreClient) {
    tokio::spawn(async move {
        // Process the event.
        let result = handle_member_join_internal(user_id, user_name, &store).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

/// Internal function to handle the member-join event.
#[instrument(skip_all)]
async fn handle_member_join_internal(user_id: u64, user_name: String, store: &StoreClient) -> Void {
    store
        .append_log(&LogEntry {
            timestamp: Utc::now(),
            action: ActionKind::MemberJoin,
            user_id,
            user_name,
            moderator_id: None,
            moderator_name: None,
            reason: "Member joined".to_string(),
            details: None,
        })
        .await
}
