//! Canned responses for direct messages.

use tracing::{Instrument, error, info, instrument};

use crate::{
    base::{config::Config, types::Void},
    interaction::command::CommandRequest,
    service::chat::ChatClient,
};

/// Handles a direct message that is not a command.
///
/// This spawns a new task to answer the message asynchronously.
#[instrument(skip_all)]
pub fn handle_direct_message(request: CommandRequest, chat: ChatClient, config: Config) {
    tokio::spawn(async move {
        // Process the event.
        let result = handle_direct_message_internal(request, &chat, &config).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

#[instrument(skip_all)]
async fn handle_direct_message_internal(request: CommandRequest, chat: &ChatClient, config: &Config) -> Void {
    info!("DM from {}: {}", request.author_name, request.content);

    let reply = choose_reply(&request.content, request.author_id, config);

    chat.send_direct_message(request.author_id, &reply).await
}

/// Pick a canned reply by keyword, in priority order.
fn choose_reply(content: &str, author_id: u64, config: &Config) -> String {
    let message = content.to_lowercase();

    if message.contains("help") {
        config.dm_help_reply.clone()
    } else if message.contains("who") || message.contains("what") {
        config.dm_about_reply.clone()
    } else if message.contains("hi") || message.contains("hello") {
        format!("Hello <@{author_id}>! How can I help?")
    } else {
        config.dm_fallback_reply.clone()
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::config::ConfigInner;
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                dm_help_reply: "help text".to_string(),
                dm_about_reply: "about text".to_string(),
                dm_fallback_reply: "fallback text".to_string(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn help_takes_priority_over_greetings() {
        let config = test_config();

        assert_eq!(choose_reply("hi, can you help me?", 42, &config), "help text");
    }

    #[test]
    fn keywords_route_to_the_right_reply() {
        let config = test_config();

        assert_eq!(choose_reply("WHO are you", 42, &config), "about text");
        assert_eq!(choose_reply("what do you do", 42, &config), "about text");
        assert_eq!(choose_reply("hello there", 42, &config), "Hello <@42>! How can I help?");
        assert_eq!(choose_reply("good evening", 42, &config), "fallback text");
    }
}
