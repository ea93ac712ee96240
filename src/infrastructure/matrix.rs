//! # Matrix Service Adapter
//!
//! Implements the `Messenger` trait for the Matrix protocol using the
//! `matrix_sdk`. This module acts as the bridge between the generic
//! `Messenger` interface used by the bot's core logic and the specific
//! implementation details of the Matrix SDK.

use crate::domain::traits::Messenger;
use crate::domain::types::SendError;
use async_trait::async_trait;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::ruma::{OwnedRoomId, UserId};
use matrix_sdk::Client;

#[derive(Clone)]
pub struct MatrixService {
    room: Room,
}

impl MatrixService {
    pub fn new(room: Room) -> Self {
        Self { room }
    }
}

#[async_trait]
impl Messenger for MatrixService {
    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }

    async fn reply(&self, content: &str) -> Result<(), String> {
        tracing::info!("Bot replying in {}: {}", self.room_id(), content);
        self.room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn direct_message(&self, user: &str, content: &str) -> Result<(), SendError> {
        // A handle that does not even parse can never receive anything;
        // server-side failures may be transient and stay retryable.
        let user_id = <&UserId>::try_from(user)
            .map_err(|_| SendError::InvalidRecipient(user.to_string()))?;
        let client = self.room.client();

        let dm = match client.get_dm_room(user_id) {
            Some(room) => room,
            None => client
                .create_dm(user_id)
                .await
                .map_err(|e| SendError::Other(e.to_string()))?,
        };

        tracing::info!("Bot sending DM to {}", user);
        dm.send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|_| ())
            .map_err(|e| SendError::Other(e.to_string()))
    }
}

/// Maintainer channel that resolves its room lazily: the admin room may not
/// be in the client's state yet when the bot starts, so lookup happens at
/// send time instead of construction time.
pub struct AdminChannel {
    client: Client,
    room_id: OwnedRoomId,
}

impl AdminChannel {
    pub fn new(client: Client, room_id: OwnedRoomId) -> Self {
        Self { client, room_id }
    }
}

#[async_trait]
impl Messenger for AdminChannel {
    fn room_id(&self) -> String {
        self.room_id.as_str().to_string()
    }

    async fn reply(&self, content: &str) -> Result<(), String> {
        let room = self
            .client
            .get_room(&self.room_id)
            .ok_or_else(|| format!("admin room {} not joined", self.room_id))?;
        room.send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn direct_message(&self, _user: &str, _content: &str) -> Result<(), SendError> {
        Err(SendError::Other(
            "admin channel does not send direct messages".to_string(),
        ))
    }
}
