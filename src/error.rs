//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::UserId;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (send error message to client).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Caller is already paired with a partner
    #[error("Already in a chat")]
    AlreadyPaired,

    /// Attempted to relay a message while not paired
    #[error("Not connected to a partner")]
    NotConnected,

    /// Attempted to end a chat while not paired
    #[error("Not in a chat")]
    NotInChat,

    /// The partner's transport is gone; the pairing has been torn down
    #[error("Partner unreachable")]
    PartnerUnreachable,

    /// A pairing was attempted between a user and themselves.
    /// The matcher never produces this; seeing it means an invariant broke.
    #[error("Attempted to pair a user with themselves")]
    SelfPair,

    /// Operation referenced a user the session store does not know
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
