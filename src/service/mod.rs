//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by the warden-bot:
//! - Chat services (e.g., Discord)
//! - Store services (e.g., SurrealDB)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod store;
