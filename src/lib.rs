//! Library root for `warden-bot`.
//!
//! Warden-bot is a moderation assistant for Discord guilds designed to:
//! - Track warnings issued against members
//! - Mute, unmute, kick, and ban members on behalf of moderators
//! - Keep an append-only log of every moderation action
//! - Answer direct messages with short canned guidance
//!
//! The bot integrates with Discord for chat and SurrealDB for storage. The
//! architecture is built around extensible traits that allow for different
//! implementations of each service.

pub mod base;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the warden-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the store and chat clients
/// - Starts the gateway event loop
pub async fn start(config: Config) -> Void {
    info!("Starting warden-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().ok();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
