//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case naming.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request a chat partner
    Find,
    /// Send a chat message to the current partner
    Chat { content: String },
    /// Indicate typing started
    Typing,
    /// Indicate typing stopped
    StopTyping,
    /// End the current chat
    End,
    /// Request server statistics
    Stats,
}

/// Server → Client message
///
/// All messages from server to client. Uses tagged enum with snake_case naming.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection successful, user ID issued
    Connected { user_id: String },
    /// No partner available yet; the user was placed in the waiting pool
    Waiting,
    /// A partner was found; the chat is live
    PartnerFound,
    /// Chat message received (anonymous - no sender identity attached)
    Chat { content: String },
    /// Partner is typing
    PartnerTyping,
    /// Partner stopped typing
    PartnerStopTyping,
    /// Partner left or was disconnected
    PartnerLeft,
    /// Chat ended by this user; includes the session summary
    ChatEnded {
        duration_secs: u64,
        messages_total: u64,
    },
    /// Server statistics snapshot
    Stats {
        users: usize,
        waiting: usize,
        active_chats: usize,
        messages_relayed: u64,
    },
    /// Error occurred
    Error { code: ErrorCode, message: String },
}

/// Error codes for ServerMessage::Error
///
/// Represents different error scenarios that can be communicated to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Attempted to find a partner while already paired
    AlreadyPaired,
    /// Attempted to chat without a partner
    NotConnected,
    /// Attempted to end a chat while not in one
    NotInChat,
    /// Delivery failed because the partner is gone
    PartnerUnreachable,
    /// Invalid message format
    InvalidMessage,
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::AlreadyPaired => (
                ErrorCode::AlreadyPaired,
                "You are already in a chat. End it first".to_string(),
            ),
            AppError::NotConnected => (
                ErrorCode::NotConnected,
                "You are not connected. Send \"find\" to get a partner".to_string(),
            ),
            AppError::NotInChat => {
                (ErrorCode::NotInChat, "You are not in a chat".to_string())
            }
            AppError::PartnerUnreachable => (
                ErrorCode::PartnerUnreachable,
                "Your partner is unreachable. The chat has been closed".to_string(),
            ),
            AppError::Json(e) => {
                (ErrorCode::InvalidMessage, format!("Invalid message format: {}", e))
            }
            // Fatal and internal errors are not detailed to clients
            _ => {
                (ErrorCode::InvalidMessage, "Internal error".to_string())
            }
        };
        ServerMessage::Error { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize() {
        let json = r#"{"type": "chat", "content": "hello"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Chat { content } => assert_eq!(content, "hello"),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_find_deserialize() {
        let json = r#"{"type": "find"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Find));
    }

    #[test]
    fn test_server_message_serialize() {
        let msg = ServerMessage::Connected {
            user_id: "test-id".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"user_id\":\"test-id\""));
    }

    #[test]
    fn test_chat_ended_serialize() {
        let msg = ServerMessage::ChatEnded {
            duration_secs: 42,
            messages_total: 7,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"chat_ended\""));
        assert!(json.contains("\"duration_secs\":42"));
        assert!(json.contains("\"messages_total\":7"));
    }

    #[test]
    fn test_error_code_serialize() {
        let msg = ServerMessage::Error {
            code: ErrorCode::PartnerUnreachable,
            message: "Test".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"code\":\"partner_unreachable\""));
    }

    #[test]
    fn test_app_error_conversion() {
        let msg: ServerMessage = AppError::AlreadyPaired.into();
        match msg {
            ServerMessage::Error { code, .. } => {
                assert!(matches!(code, ErrorCode::AlreadyPaired))
            }
            _ => panic!("Wrong variant"),
        }
    }
}
