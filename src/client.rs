//! Client struct definition
//!
//! Represents a connected client with their communication channel.
//! Clients are anonymous: no name or profile is ever attached.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::UserId;

/// Connected client transport handle
///
/// Holds the server → client message channel for a connected user plus the
/// typing flag relayed to the partner while paired.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: UserId,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
    /// Currently typing flag
    pub is_typing: bool,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: UserId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            sender,
            is_typing: false,
        }
    }

    /// Send a message to this client
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Set typing status
    pub fn set_typing(&mut self, is_typing: bool) {
        self.is_typing = is_typing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let client = Client::new(UserId::new(), tx);

        assert!(!client.is_typing);
    }

    #[tokio::test]
    async fn test_client_send() {
        let (tx, mut rx) = mpsc::channel(32);
        let client = Client::new(UserId::new(), tx);

        client.send(ServerMessage::Waiting).await.unwrap();
        assert!(matches!(rx.recv().await, Some(ServerMessage::Waiting)));
    }

    #[tokio::test]
    async fn test_client_send_closed_channel() {
        let (tx, rx) = mpsc::channel(32);
        let client = Client::new(UserId::new(), tx);
        drop(rx);

        assert!(client.send(ServerMessage::Waiting).await.is_err());
    }
}
