//! # Domain Traits
//!
//! Abstract interfaces for the external collaborators (chat platform, document store).
//! Allows for pluggable implementations in the Infrastructure layer.

use async_trait::async_trait;

use crate::domain::types::SendError;

/// Abstract interface for the messaging platform (e.g., Matrix, Console).
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a reply into the room the triggering message came from.
    async fn reply(&self, content: &str) -> Result<(), String>;

    /// Send a private message to a single user.
    async fn direct_message(&self, user: &str, content: &str) -> Result<(), SendError>;

    /// Get the current room ID.
    fn room_id(&self) -> String;
}

/// Abstract interface for the store holding the membership document
/// (a wiki page in production, a local file in development).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current document text.
    async fn fetch(&self) -> Result<String, String>;

    /// Replace the document text, recording a human-readable revision reason.
    async fn publish(&self, content: &str, reason: &str) -> Result<(), String>;
}
